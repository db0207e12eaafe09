use crate::grammar::features::{self, Features, WordClass};
use crate::grammar::{Grammar, TerminalKind};
use crate::lexicon::{Lexicon, Meaning};
use crate::matcher::Lattice;
use crate::reducer::Deriv;
use crate::tokens::{Tok, TokKind};

// The simplifier rewrites a grammar-level derivation into the documented
// constituency tree. Nonterminals with a registered public tag survive;
// everything else (naming wrappers, agreement variants, list scaffolding)
// splices its children into the parent. Leaves keep their token, the
// terminal descriptor, and the winning meaning. The tree is an arena of
// nodes with integer indices; children and parents are index links.

// The closed public tag vocabulary. Grammar builders may only register
// tags drawn from this list.
pub const TAGS: &[&str] = &[
  "S0",
  "S-MAIN",
  "S-HEADING",
  "S-PREFIX",
  "S-QUE",
  "CP-THT",
  "CP-QUE",
  "CP-REL",
  "CP-ADV-TEMP",
  "CP-ADV-PURP",
  "CP-ADV-ACK",
  "CP-ADV-CONS",
  "CP-ADV-CAUSE",
  "CP-ADV-COND",
  "CP-ADV-CMP",
  "CP-QUOTE",
  "IP",
  "IP-INF",
  "NP",
  "NP-SUBJ",
  "NP-OBJ",
  "NP-IOBJ",
  "NP-PRD",
  "NP-ADP",
  "NP-POSS",
  "NP-ADDR",
  "NP-TITLE",
  "NP-COMPANY",
  "NP-MEASURE",
  "NP-AGE",
  "ADJP",
  "VP",
  "VP-AUX",
  "PP",
  "ADVP",
  "ADVP-DIR",
  "ADVP-DATE-ABS",
  "ADVP-DATE-REL",
  "ADVP-TIMESTAMP-ABS",
  "ADVP-TIMESTAMP-REL",
  "ADVP-TMP-SET",
  "ADVP-DUR-ABS",
  "ADVP-DUR-REL",
  "ADVP-DUR-TIME",
  "P",
  "TO",
  "C",
];

pub const NO_PARENT: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq)]
pub enum SimpleNode {
  Inner { tag: &'static str, children: Vec<u32>, parent: u32 },
  Leaf {
    token: u32,
    text: String,
    kind: TokKind,
    descriptor: String,
    variants: Features,
    meaning: Option<Meaning>,
    parent: u32,
  },
}

pub struct SimpleTree {
  nodes: Vec<SimpleNode>,
  root: u32,
}

// A query tag matches a node tag when it names the same head segments:
// "NP" matches "NP-SUBJ", and "ADVP-DATE" matches "ADVP-DATE-ABS", but
// "NP-SUBJ" does not match a plain "NP".
pub fn matches_tag(tag: &str, query: &str) -> bool {
  tag == query || (tag.starts_with(query) && tag[query.len()..].starts_with('-'))
}

pub fn simplify(
  grammar: &Grammar,
  deriv: &Deriv,
  tokens: &[Tok],
  lattice: &Lattice,
) -> Option<SimpleTree> {
  let mut builder = Builder { grammar, tokens, lattice, nodes: vec![] };
  let roots = builder.build(deriv, NO_PARENT);
  match roots.as_slice() {
    [root] => Some(SimpleTree { nodes: builder.nodes, root: *root }),
    _ => None,
  }
}

struct Builder<'a> {
  grammar: &'a Grammar,
  tokens: &'a [Tok],
  lattice: &'a Lattice,
  nodes: Vec<SimpleNode>,
}

impl<'a> Builder<'a> {
  fn build(&mut self, deriv: &Deriv, parent: u32) -> Vec<u32> {
    match deriv {
      Deriv::Leaf { terminal, token } => vec![self.leaf(*terminal, *token, parent)],
      Deriv::Node { prod, children } => {
        let lhs = self.grammar.production(*prod).lhs;
        let tag = self.grammar.tag(lhs).and_then(|x| TAGS.iter().find(|y| **y == x)).cloned();
        match tag {
          None => children.iter().flat_map(|x| self.build(x, parent)).collect(),
          Some(tag) => {
            let index = self.nodes.len() as u32;
            self.nodes.push(SimpleNode::Inner { tag, children: vec![], parent });
            let kids: Vec<u32> = children.iter().flat_map(|x| self.build(x, index)).collect();
            if kids.is_empty() {
              self.nodes.pop();
              return vec![];
            }
            if let SimpleNode::Inner { children, .. } = &mut self.nodes[index as usize] {
              *children = kids;
            }
            vec![index]
          }
        }
      }
    }
  }

  fn leaf(&mut self, terminal: u32, token: u32, parent: u32) -> u32 {
    let meaning =
      self.lattice.get(token as usize, terminal).and_then(|x| x.meaning.as_ref()).cloned();
    let spec = self.grammar.terminal(terminal);
    let variants = spec.variants | meaning.as_ref().map_or(0, |x| x.features);
    let tok = &self.tokens[token as usize];
    let descriptor = descriptor(&spec.kind, &spec.name, meaning.as_ref(), &tok.text);
    let index = self.nodes.len() as u32;
    self.nodes.push(SimpleNode::Leaf {
      token,
      text: tok.text.clone(),
      kind: tok.kind,
      descriptor,
      variants,
      meaning,
      parent,
    });
    index
  }
}

// The terminal descriptor shown at each leaf: the terminal's category with
// its significant variants, as named in the grammar. Punctuation renders as
// a bare "p"; a literal terminal borrows its meaning's word class.
fn descriptor(kind: &TerminalKind, name: &str, meaning: Option<&Meaning>, text: &str) -> String {
  match kind {
    TerminalKind::Typed(TokKind::Punctuation) => "p".to_string(),
    TerminalKind::Typed(_) | TerminalKind::Class(_) => name.to_string(),
    TerminalKind::Text(_) | TerminalKind::Lemma(_) => match meaning {
      Some(x) => x.class.name().to_string(),
      None => text.to_lowercase(),
    },
  }
}

impl SimpleTree {
  pub fn root(&self) -> u32 {
    self.root
  }

  pub fn node(&self, index: u32) -> &SimpleNode {
    &self.nodes[index as usize]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn tag(&self, index: u32) -> Option<&'static str> {
    match self.node(index) {
      SimpleNode::Inner { tag, .. } => Some(tag),
      SimpleNode::Leaf { .. } => None,
    }
  }

  pub fn children(&self, index: u32) -> &[u32] {
    match self.node(index) {
      SimpleNode::Inner { children, .. } => children,
      SimpleNode::Leaf { .. } => &[],
    }
  }

  pub fn parent(&self, index: u32) -> Option<u32> {
    let parent = match self.node(index) {
      SimpleNode::Inner { parent, .. } => *parent,
      SimpleNode::Leaf { parent, .. } => *parent,
    };
    if parent == NO_PARENT {
      None
    } else {
      Some(parent)
    }
  }

  // Leaves in token order; the yield of the tree.
  pub fn leaves(&self) -> Vec<u32> {
    let mut result = vec![];
    self.walk(self.root, &mut |tree, index| {
      if matches!(tree.node(index), SimpleNode::Leaf { .. }) {
        result.push(index);
      }
    });
    result
  }

  // The first node matching the query tag, in top-down left-to-right order.
  pub fn first(&self, query: &str) -> Option<u32> {
    self.all(query).into_iter().next()
  }

  pub fn all(&self, query: &str) -> Vec<u32> {
    let mut result = vec![];
    self.walk(self.root, &mut |tree, index| {
      if tree.tag(index).map_or(false, |x| matches_tag(x, query)) {
        result.push(index);
      }
    });
    result
  }

  pub fn lemmas(&self) -> Vec<String> {
    let f = |node: &SimpleNode| match node {
      SimpleNode::Leaf { meaning: Some(x), .. } => Some(x.lemma.clone()),
      SimpleNode::Leaf { text, .. } => Some(text.clone()),
      _ => None,
    };
    self.leaves().iter().filter_map(|x| f(self.node(*x))).collect()
  }

  pub fn nouns(&self) -> Vec<String> {
    self.class_lemmas(WordClass::No)
  }

  pub fn verbs(&self) -> Vec<String> {
    self.class_lemmas(WordClass::So)
  }

  // The full variant set of a leaf: the terminal's significant variants
  // plus every feature carried by the winning meaning record.
  pub fn all_variants(&self, index: u32) -> Vec<&'static str> {
    match self.node(index) {
      SimpleNode::Leaf { variants, .. } => features::describe(*variants),
      SimpleNode::Inner { .. } => vec![],
    }
  }

  pub fn persons(&self) -> Vec<String> {
    self.kind_texts(TokKind::Person)
  }

  pub fn entities(&self) -> Vec<String> {
    self.kind_texts(TokKind::Entity)
  }

  // The indented, one-node-per-line rendering.
  pub fn view(&self) -> String {
    let mut lines = vec![];
    self.view_node(self.root, 0, &mut lines);
    lines.join("\n")
  }

  // The flat rendering: TAG ... /TAG bracketing with terminal descriptors
  // as leaves, space-separated.
  pub fn flat(&self) -> String {
    let mut parts = vec![];
    self.flat_node(self.root, &mut parts);
    parts.join(" ")
  }

  // Re-inflect the noun phrase at the given node into the target case.
  // Subtrees that govern their own case (PP, NP-POSS, clauses) pass through
  // unchanged; declinable leaves are re-looked-up in the lexicon.
  pub fn inflected(&self, index: u32, case: Features, force: Features, lexicon: &Lexicon) -> String {
    let mut words = vec![];
    self.inflect_node(index, case, force, lexicon, true, &mut words);
    words.join(" ")
  }

  pub fn nominative(&self, index: u32, lexicon: &Lexicon) -> String {
    self.inflected(index, features::NF, 0, lexicon)
  }

  pub fn indefinite_nominative(&self, index: u32, lexicon: &Lexicon) -> String {
    self.inflected(index, features::NF, features::GR | features::VB, lexicon)
  }

  pub fn canonical(&self, index: u32, lexicon: &Lexicon) -> String {
    let strip = features::GR | features::VB | features::FT;
    self.inflected(index, features::NF | features::ET, strip, lexicon)
  }

  fn inflect_node(
    &self,
    index: u32,
    case: Features,
    strip: Features,
    lexicon: &Lexicon,
    inflect: bool,
    out: &mut Vec<String>,
  ) {
    match self.node(index) {
      SimpleNode::Inner { tag, children, .. } => {
        let fixed = ["PP", "NP-POSS", "CP", "S"].iter().any(|x| matches_tag(tag, x));
        for child in children {
          self.inflect_node(*child, case, strip, lexicon, inflect && !fixed, out);
        }
      }
      SimpleNode::Leaf { text, meaning, .. } => {
        let word = match meaning {
          Some(x) if inflect && declines(x.class) => {
            let mut target = (x.features & !features::CASES & !strip) | case;
            // Dropping the definite reading moves adjectives back to their
            // strong declension.
            if strip & features::VB != 0 && x.class == WordClass::Lo {
              target |= features::SB;
            }
            match lexicon.lookup_variant(&x.lemma, x.class, target).into_iter().next() {
              Some(form) => match_capitalization(text, &form),
              None => text.clone(),
            }
          }
          _ => text.clone(),
        };
        out.push(word);
      }
    }
  }

  fn class_lemmas(&self, class: WordClass) -> Vec<String> {
    let f = |node: &SimpleNode| match node {
      SimpleNode::Leaf { meaning: Some(x), .. } if x.class == class => Some(x.lemma.clone()),
      _ => None,
    };
    self.leaves().iter().filter_map(|x| f(self.node(*x))).collect()
  }

  fn kind_texts(&self, kind: TokKind) -> Vec<String> {
    let f = |node: &SimpleNode| match node {
      SimpleNode::Leaf { kind: x, text, .. } if *x == kind => Some(text.clone()),
      _ => None,
    };
    self.leaves().iter().filter_map(|x| f(self.node(*x))).collect()
  }

  fn walk(&self, index: u32, visit: &mut impl FnMut(&SimpleTree, u32)) {
    visit(self, index);
    for child in self.children(index).to_vec() {
      self.walk(child, visit);
    }
  }

  fn view_node(&self, index: u32, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match self.node(index) {
      SimpleNode::Inner { tag, children, .. } => {
        lines.push(format!("{}{}", indent, tag));
        for child in children {
          self.view_node(*child, depth + 1, lines);
        }
      }
      SimpleNode::Leaf { descriptor, text, .. } => {
        lines.push(format!("{}{}: '{}'", indent, descriptor, text));
      }
    }
  }

  fn flat_node(&self, index: u32, parts: &mut Vec<String>) {
    match self.node(index) {
      SimpleNode::Inner { tag, children, .. } => {
        parts.push(tag.to_string());
        for child in children {
          self.flat_node(*child, parts);
        }
        parts.push(format!("/{}", tag));
      }
      SimpleNode::Leaf { descriptor, .. } => parts.push(descriptor.clone()),
    }
  }
}

fn declines(class: WordClass) -> bool {
  matches!(
    class,
    WordClass::No
      | WordClass::Lo
      | WordClass::Fn
      | WordClass::Pfn
      | WordClass::Abfn
      | WordClass::Gr
      | WordClass::To
  )
}

fn match_capitalization(original: &str, form: &str) -> String {
  let capitalized = original.chars().next().map_or(false, |x| x.is_uppercase());
  if !capitalized {
    return form.to_string();
  }
  let mut chars = form.chars();
  match chars.next() {
    None => form.to_string(),
    Some(x) => x.to_uppercase().collect::<String>() + chars.as_str(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_matching_is_by_head_segments() {
    assert!(matches_tag("NP-SUBJ", "NP"));
    assert!(matches_tag("NP-SUBJ", "NP-SUBJ"));
    assert!(matches_tag("ADVP-DATE-ABS", "ADVP-DATE"));
    assert!(matches_tag("ADVP-DATE-ABS", "ADVP"));
    assert!(!matches_tag("NP", "NP-SUBJ"));
    assert!(!matches_tag("NPX", "NP"));
    assert!(!matches_tag("VP-AUX", "VP-A"));
  }

  #[test]
  fn capitalization_carries_over() {
    assert_eq!(match_capitalization("Litla", "lítil"), "Lítil");
    assert_eq!(match_capitalization("litla", "lítil"), "lítil");
    assert_eq!(match_capitalization("ÁSA", "ása"), "Ása");
  }
}
