use super::features::{self, Features, WordClass};
use crate::lexicon::Meaning;
use crate::tokens::TokKind;
use crate::util::base::{Error, Result};

// Terminals are typed predicates over tokens, parsed from their grammar
// names. Three families exist: word-class terminals with feature variants
// (no_et_þf_kvk), typed-token terminals (tala, ártal, person, ...), and
// literal terminals ("orð" matches surface text, 'orð' matches a lemma).
// Verb terminals may also carry an argument spec: so_0, so_1_þf, and
// so_2_þgf_þf pin the number and cases of the verb's objects.

#[derive(Clone, Debug, PartialEq)]
pub enum TerminalKind {
  Class(WordClass),
  Typed(TokKind),
  Text(String),
  Lemma(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Terminal {
  pub name: String,
  pub kind: TerminalKind,
  pub variants: Features,
  pub args: Option<Vec<Features>>,
}

const TYPED: &[(&str, TokKind)] = &[
  ("person", TokKind::Person),
  ("entity", TokKind::Entity),
  ("sérnafn", TokKind::Entity),
  ("fyrirtæki", TokKind::Company),
  ("gata", TokKind::Street),
  ("tala", TokKind::Number),
  ("prósenta", TokKind::Percent),
  ("ártal", TokKind::Year),
  ("raðnr", TokKind::Ordinal),
  ("sequence", TokKind::Sequence),
  ("dagsföst", TokKind::DateAbs),
  ("dagsafs", TokKind::DateRel),
  ("tími", TokKind::Time),
  ("tímapunktur", TokKind::Timestamp),
  ("lén", TokKind::Domain),
  ("myllumerki", TokKind::Hashtag),
  ("tölvupóstfang", TokKind::Email),
  ("grm", TokKind::Punctuation),
];

impl Terminal {
  pub fn parse(name: &str) -> Result<Terminal> {
    let bad = |x: String| Error::CorruptGrammar(x);
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
      let kind = TerminalKind::Text(name[1..name.len() - 1].to_lowercase());
      return Ok(Terminal { name: name.to_string(), kind, variants: 0, args: None });
    }
    if name.len() >= 2 && name.starts_with('\'') && name.ends_with('\'') {
      let kind = TerminalKind::Lemma(name[1..name.len() - 1].to_lowercase());
      return Ok(Terminal { name: name.to_string(), kind, variants: 0, args: None });
    }
    let mut parts = name.split('_');
    let head = parts.next().ok_or_else(|| bad(format!("Empty terminal name: {:?}", name)))?;
    let kind = match WordClass::from_name(head) {
      Some(x) => TerminalKind::Class(x),
      None => {
        let typed = TYPED.iter().find(|(x, _)| *x == head).map(|(_, x)| *x);
        TerminalKind::Typed(typed.ok_or_else(|| bad(format!("Unknown terminal: {:?}", name)))?)
      }
    };
    let rest: Vec<&str> = parts.collect();
    let mut variants = 0;
    let mut args = None;
    let mut i = 0;
    if kind == TerminalKind::Class(WordClass::So) && i < rest.len() {
      if let Ok(count) = rest[i].parse::<usize>() {
        if count > 2 {
          return Err(bad(format!("Verb terminal with {} arguments: {:?}", count, name)));
        }
        i += 1;
        let mut cases = vec![];
        for _ in 0..count {
          let case = rest.get(i).and_then(|x| features::parse_case(x));
          cases.push(case.ok_or_else(|| bad(format!("Bad argument case in {:?}", name)))?);
          i += 1;
        }
        args = Some(cases);
      }
    }
    for part in &rest[i..] {
      let feature = features::parse(part)
        .ok_or_else(|| bad(format!("Unknown variant {:?} in terminal {:?}", part, name)))?;
      variants |= feature;
    }
    Ok(Terminal { name: name.to_string(), kind, variants, args })
  }

  // The pure relation between a terminal and one meaning record: the
  // terminal's category must cover the meaning's word class, the required
  // variants must be a subset of the meaning's features, and an argument
  // spec must match the meaning's argument structure exactly.
  pub fn matches_meaning(&self, meaning: &Meaning) -> bool {
    let class = match &self.kind {
      TerminalKind::Class(x) => *x,
      TerminalKind::Lemma(x) => return meaning.lemma.to_lowercase() == *x,
      _ => return false,
    };
    if !class.covers(meaning.class) {
      return false;
    }
    if self.variants & meaning.features != self.variants {
      return false;
    }
    match &self.args {
      None => true,
      Some(x) => meaning.args.as_ref() == Some(x),
    }
  }
}
