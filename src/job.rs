use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::matcher;
use crate::parser::{self, Limits, ParseError};
use crate::reducer;
use crate::settings::Scores;
use crate::tokens::{self, Tok, TokKind};
use crate::tree::SimpleTree;
use crate::util::base::Result;
use crate::util::lock::Lock;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// The sentence/job façade: raw text in, parsed sentences and job statistics
// out. A job borrows the shared read-only grammar, lexicon and scoring
// configuration; every sentence owns its tokens, lattice, forest and tree,
// so sentences can be parsed on any number of threads.

pub struct Settings {
  pub max_tokens: usize,
  pub timeout_ms: Option<u64>,
  pub foreign_threshold: f64,
  pub parse_foreign_sentences: bool,
}

impl Default for Settings {
  fn default() -> Settings {
    Settings {
      max_tokens: 90,
      timeout_ms: None,
      foreign_threshold: 0.5,
      parse_foreign_sentences: false,
    }
  }
}

pub struct Job<'a> {
  grammar: &'a Grammar,
  lexicon: Option<&'a Lexicon>,
  scores: &'a Scores,
  pub settings: Settings,
}

pub struct Parsed {
  pub tree: SimpleTree,
  pub score: i64,
}

pub struct Sentence {
  pub tokens: Vec<Tok>,
  pub outcome: std::result::Result<Parsed, ParseError>,
  pub combinations: u64,
  pub millis: u64,
}

pub struct Stats {
  pub sentences: usize,
  pub parsed: usize,
  pub ambiguity: f64,
  pub millis: u64,
}

impl<'a> Job<'a> {
  pub fn new(grammar: &'a Grammar, scores: &'a Scores) -> Job<'a> {
    Job { grammar, lexicon: None, scores, settings: Settings::default() }
  }

  pub fn with_lexicon(mut self, lexicon: &'a Lexicon) -> Job<'a> {
    self.lexicon = Some(lexicon);
    self
  }

  // Tokenize, segment and parse a whole text. Sentences come back in input
  // order; paragraph markers partition the stream and are dropped.
  pub fn parse_text(&self, text: &str) -> (Vec<Sentence>, Stats) {
    let tokens = tokens::tokenize(text, self.lexicon);
    let sentences: Vec<Sentence> =
      split_sentences(tokens).into_iter().map(|x| self.parse_tokens(x)).collect();
    let stats = statistics(&sentences);
    (sentences, stats)
  }

  // The parallel variant: sentences share nothing but the read-only grammar,
  // lexicon and configuration, so a worker pool can drain them in any order.
  // Results still come back in input order.
  pub fn parse_text_parallel(&self, text: &str, threads: usize) -> (Vec<Sentence>, Stats) {
    let tokens = tokens::tokenize(text, self.lexicon);
    let pending = split_sentences(tokens);
    if threads <= 1 || pending.len() <= 1 {
      let sentences: Vec<Sentence> = pending.into_iter().map(|x| self.parse_tokens(x)).collect();
      let stats = statistics(&sentences);
      return (sentences, stats);
    }
    let next = std::sync::atomic::AtomicUsize::new(0);
    let results = std::sync::Mutex::new(Vec::with_capacity(pending.len()));
    std::thread::scope(|scope| {
      for _ in 0..threads.min(pending.len()) {
        scope.spawn(|| loop {
          let i = next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
          if i >= pending.len() {
            break;
          }
          let sentence = self.parse_tokens(pending[i].clone());
          if let Ok(mut slot) = results.lock() {
            slot.push((i, sentence));
          }
        });
      }
    });
    let mut indexed = results.into_inner().unwrap_or_default();
    indexed.sort_by_key(|x| x.0);
    let sentences: Vec<Sentence> = indexed.into_iter().map(|x| x.1).collect();
    let stats = statistics(&sentences);
    (sentences, stats)
  }

  pub fn parse_tokens(&self, tokens: Vec<Tok>) -> Sentence {
    let started = Instant::now();
    let outcome = self.run(&tokens);
    let (outcome, combinations) = match outcome {
      Ok((parsed, combinations)) => (Ok(parsed), combinations),
      Err(x) => (Err(x), 0),
    };
    let millis = started.elapsed().as_millis() as u64;
    match &outcome {
      Ok(x) => log::debug!("parsed {} tokens, score {}, {} ms", tokens.len(), x.score, millis),
      Err(x) => log::debug!("sentence of {} tokens failed: {}", tokens.len(), x),
    }
    Sentence { tokens, outcome, combinations, millis }
  }

  fn run(&self, tokens: &[Tok]) -> std::result::Result<(Parsed, u64), ParseError> {
    if self.lexicon.is_some() && !self.settings.parse_foreign_sentences {
      if let Some(ratio) = known_ratio(tokens) {
        if ratio < self.settings.foreign_threshold {
          return Err(ParseError::Foreign((ratio * 100.0) as u32));
        }
      }
    }
    let limits = Limits {
      max_tokens: self.settings.max_tokens,
      timeout: self.settings.timeout_ms.map(std::time::Duration::from_millis),
    };
    let lattice = matcher::build(self.grammar, tokens, self.scores);
    let forest = parser::parse(self.grammar, &lattice, &limits)?;
    let reduction = reducer::reduce(self.grammar, &forest, &lattice, self.scores);
    let stalled = || ParseError::Failure(tokens.len().saturating_sub(1));
    let deriv = reducer::extract(&forest, &reduction).ok_or_else(stalled)?;
    let tree =
      crate::tree::simplify(self.grammar, &deriv, tokens, &lattice).ok_or_else(stalled)?;
    Ok((Parsed { tree, score: reduction.score }, reduction.combinations.max(1)))
  }
}

// The ratio of word tokens the lexicon knows. Typed tokens are neutral;
// a sentence with no word tokens at all is never foreign.
pub fn known_ratio(tokens: &[Tok]) -> Option<f64> {
  let words: Vec<&Tok> = tokens.iter().filter(|x| x.kind == TokKind::Word).collect();
  if words.is_empty() {
    return None;
  }
  let known = words.iter().filter(|x| !x.meanings().is_empty()).count();
  Some(known as f64 / words.len() as f64)
}

fn split_sentences(tokens: Vec<Tok>) -> Vec<Vec<Tok>> {
  let mut result = vec![];
  let mut current = vec![];
  for token in tokens {
    match token.kind {
      TokKind::ParagraphBegin | TokKind::ParagraphEnd => {
        if !current.is_empty() {
          result.push(std::mem::replace(&mut current, vec![]));
        }
      }
      _ => {
        let done = token.ends_sentence();
        current.push(token);
        if done {
          result.push(std::mem::replace(&mut current, vec![]));
        }
      }
    }
  }
  if !current.is_empty() {
    result.push(current);
  }
  result
}

// Job statistics: the ambiguity figure is the token-count-weighted
// geometric mean of the per-sentence combination counts.
fn statistics(sentences: &[Sentence]) -> Stats {
  let parsed: Vec<&Sentence> = sentences.iter().filter(|x| x.outcome.is_ok()).collect();
  let weight: f64 = parsed.iter().map(|x| x.tokens.len() as f64).sum();
  let ambiguity = if parsed.is_empty() || weight == 0.0 {
    0.0
  } else {
    let log_sum: f64 = parsed
      .iter()
      .map(|x| x.tokens.len() as f64 * (x.combinations.max(1) as f64).ln())
      .sum();
    (log_sum / weight).exp()
  };
  Stats {
    sentences: sentences.len(),
    parsed: parsed.len(),
    ambiguity,
    millis: sentences.iter().map(|x| x.millis).sum(),
  }
}

// Grammar compilation happens behind the well-known advisory lock so that
// concurrent processes do not compile the same artifacts twice.
pub fn load_grammar_locked<F: FnOnce() -> Result<Grammar>>(load: F) -> Result<Grammar> {
  let _lock = Lock::acquire("greinir-grammar")?;
  load()
}

// The JSON dump form of a sentence: text, token list, terminal descriptors,
// the flat tree, and the score. Round-trips through serde.

#[derive(Deserialize, Serialize)]
pub struct Dump {
  pub text: String,
  pub tokens: Vec<Tok>,
  pub terminals: Vec<String>,
  pub tree: Option<String>,
  pub score: i64,
  pub error: Option<String>,
}

impl Sentence {
  pub fn text(&self) -> String {
    let texts: Vec<&str> = self.tokens.iter().map(|x| x.text.as_str()).collect();
    texts.join(" ")
  }

  pub fn dump(&self) -> Dump {
    let (terminals, tree, score, error) = match &self.outcome {
      Ok(x) => {
        let leaves = x.tree.leaves();
        let descriptors = leaves
          .iter()
          .filter_map(|y| match x.tree.node(*y) {
            crate::tree::SimpleNode::Leaf { descriptor, .. } => Some(descriptor.clone()),
            _ => None,
          })
          .collect();
        (descriptors, Some(x.tree.flat()), x.score, None)
      }
      Err(x) => (vec![], None, 0, Some(x.to_string())),
    };
    Dump { text: self.text(), tokens: self.tokens.clone(), terminals, tree, score, error }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::features::*;
  use crate::testgrammar::*;
  use crate::tree::SimpleNode;

  fn parse_one(text: &str) -> Sentence {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let (mut sentences, _) = job.parse_text(text);
    assert_eq!(sentences.len(), 1, "expected one sentence from {:?}", text);
    sentences.remove(0)
  }

  fn tree_of(sentence: &Sentence) -> &SimpleTree {
    &sentence.outcome.as_ref().unwrap().tree
  }

  fn descriptor_of(tree: &SimpleTree, index: u32) -> String {
    match tree.node(index) {
      SimpleNode::Leaf { descriptor, .. } => descriptor.clone(),
      x => panic!("expected leaf, got {:?}", x),
    }
  }

  #[test]
  fn simple_transitive_sentence() {
    let sentence = parse_one("Ása sá sól.");
    let tree = tree_of(&sentence);
    assert_eq!(
      tree.flat(),
      "S0 S-MAIN IP NP-SUBJ no_et_nf_kvk /NP-SUBJ VP VP so_1_þf_et_p3 /VP \
       NP-OBJ no_et_þf_kvk /NP-OBJ /VP /IP /S-MAIN p /S0"
    );
    assert_eq!(tree.nouns(), vec!["Ása", "sól"]);
    assert_eq!(tree.verbs(), vec!["sjá"]);
    assert_eq!(tree.lemmas(), vec!["Ása", "sjá", "sól", "."]);
    assert_eq!(sentence.combinations, 1);
  }

  #[test]
  fn stacked_adjectives_flatten_into_the_subject() {
    let sentence = parse_one("Litla gula hænan fann fræ.");
    let tree = tree_of(&sentence);
    let subject = tree.first("NP-SUBJ").unwrap();
    let children = tree.children(subject).to_vec();
    assert_eq!(children.len(), 3);
    assert_eq!(descriptor_of(tree, children[0]), "lo_nf_et_kvk");
    assert_eq!(descriptor_of(tree, children[1]), "lo_nf_et_kvk");
    assert_eq!(descriptor_of(tree, children[2]), "no_et_nf_kvk");
    let object = tree.first("NP-OBJ").unwrap();
    assert_eq!(descriptor_of(tree, tree.children(object)[0]), "no_et_þf_hk");
    assert_eq!(tree.lemmas(), vec!["lítill", "gulur", "hæna", "finna", "fræ", "."]);
  }

  #[test]
  fn ditransitive_sentence_with_amount_object() {
    let sentence = parse_one("Jón greiddi bænum 10 milljónir króna.");
    let tree = tree_of(&sentence);
    let verb = tree.all("VP")[1];
    assert_eq!(descriptor_of(tree, tree.children(verb)[0]), "so_2_þgf_þf_et_p3");
    let iobj = tree.first("NP-IOBJ").unwrap();
    assert_eq!(descriptor_of(tree, tree.children(iobj)[0]), "no_et_þgf_kk");
    let object = tree.first("NP-OBJ").unwrap();
    let children = tree.children(object).to_vec();
    assert_eq!(children.len(), 3);
    assert_eq!(descriptor_of(tree, children[0]), "tala_ft_þf_kvk");
    assert_eq!(descriptor_of(tree, children[1]), "no_ft_þf_kvk");
    assert_eq!(tree.tag(children[2]), Some("NP-POSS"));
    assert_eq!(descriptor_of(tree, tree.children(children[2])[0]), "no_ft_ef_kvk");
  }

  #[test]
  fn impersonal_sentence_with_auxiliary() {
    let sentence = parse_one("Seldum fasteignum hefur fjölgað.");
    let tree = tree_of(&sentence);
    assert_eq!(
      tree.flat(),
      "S0 S-MAIN IP NP-SUBJ lo_þgf_ft_kvk no_ft_þgf_kvk /NP-SUBJ VP VP-AUX so_et_p3 /VP-AUX \
       VP so_sagnb /VP /VP /IP /S-MAIN p /S0"
    );
  }

  #[test]
  fn prepositional_phrases_attach_low() {
    let sentence = parse_one("Ása sá sól á himni.");
    assert_eq!(sentence.combinations, 2);
    let tree = tree_of(&sentence);
    // The object-internal attachment wins over the verb-phrase attachment,
    // so the PP sits under NP-OBJ.
    let object = tree.first("NP-OBJ").unwrap();
    let children = tree.children(object).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(tree.tag(children[1]), Some("PP"));
    let outer = tree.first("VP").unwrap();
    assert!(tree.children(outer).iter().all(|x| tree.tag(*x) != Some("PP")));
    let pp = tree.first("PP").unwrap();
    assert_eq!(descriptor_of(tree, tree.children(pp)[0]), "fs_þgf");
    assert_eq!(descriptor_of(tree, tree.children(pp)[1]), "no_et_þgf_kk");
  }

  #[test]
  fn terminals_align_with_tokens() {
    let sentence = parse_one("Jón greiddi bænum 10 milljónir króna.");
    let tree = tree_of(&sentence);
    let leaves = tree.leaves();
    assert_eq!(leaves.len(), sentence.tokens.len());
    for (i, leaf) in leaves.iter().enumerate() {
      match tree.node(*leaf) {
        SimpleNode::Leaf { token, text, .. } => {
          assert_eq!(*token as usize, i);
          assert_eq!(*text, sentence.tokens[i].text);
        }
        x => panic!("expected leaf, got {:?}", x),
      }
    }
  }

  #[test]
  fn flat_and_view_agree_on_content() {
    let sentence = parse_one("Ása sá sól.");
    let tree = tree_of(&sentence);
    let mut from_flat: Vec<String> = tree
      .flat()
      .split_whitespace()
      .filter(|x| !x.starts_with('/'))
      .map(|x| x.to_string())
      .collect();
    let mut from_view: Vec<String> = tree
      .view()
      .lines()
      .map(|x| x.trim().split(':').next().unwrap_or("").to_string())
      .collect();
    from_flat.sort();
    from_view.sort();
    assert_eq!(from_flat, from_view);
  }

  #[test]
  fn parsing_is_idempotent() {
    let first = parse_one("Litla gula hænan fann fræ.");
    let second = parse_one("Litla gula hænan fann fræ.");
    assert_eq!(tree_of(&first).view(), tree_of(&second).view());
    assert_eq!(tree_of(&first).flat(), tree_of(&second).flat());
    let a = &first.outcome.as_ref().unwrap().score;
    let b = &second.outcome.as_ref().unwrap().score;
    assert_eq!(a, b);
  }

  #[test]
  fn failure_carries_the_error_index() {
    let sentence = parse_one("Ása sá Ása sól.");
    match &sentence.outcome {
      Err(ParseError::Failure(x)) => assert_eq!(*x, 2),
      x => panic!("expected failure, got success: {:?}", x.is_ok()),
    }
  }

  #[test]
  fn long_sentences_are_refused() {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let mut job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    job.settings.max_tokens = 3;
    let (sentences, stats) = job.parse_text("Jón greiddi bænum 10 milljónir króna.");
    match &sentences[0].outcome {
      Err(ParseError::TooLong(x)) => assert_eq!(*x, 7),
      _ => panic!("expected TooLong"),
    }
    assert_eq!(stats.parsed, 0);
  }

  #[test]
  fn foreign_sentences_are_detected() {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let (sentences, _) = job.parse_text("Lorem ipsum dolor sit.");
    match &sentences[0].outcome {
      Err(ParseError::Foreign(x)) => assert!(*x < 50),
      _ => panic!("expected Foreign"),
    }
    let mut job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    job.settings.parse_foreign_sentences = true;
    let (sentences, _) = job.parse_text("Lorem ipsum dolor sit.");
    match &sentences[0].outcome {
      Err(ParseError::Failure(_)) => {}
      _ => panic!("expected plain failure once foreign parsing is enabled"),
    }
  }

  #[test]
  fn paragraphs_and_multiple_sentences() {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let text = "[[ Ása sá sól. Seldum fasteignum hefur fjölgað. ]] [[ Ása sá sól ]]";
    let (sentences, stats) = job.parse_text(text);
    assert_eq!(sentences.len(), 3);
    assert_eq!(stats.sentences, 3);
    assert_eq!(stats.parsed, 3);
    assert!(stats.ambiguity >= 1.0);
    assert_eq!(sentences[2].tokens.len(), 3);
    assert!(sentences[2].outcome.is_ok());
  }

  #[test]
  fn parallel_parsing_matches_serial() {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let text = "Ása sá sól. Seldum fasteignum hefur fjölgað. Litla gula hænan fann fræ.";
    let (serial, serial_stats) = job.parse_text(text);
    let (parallel, parallel_stats) = job.parse_text_parallel(text, 4);
    assert_eq!(serial.len(), parallel.len());
    assert_eq!(serial_stats.parsed, parallel_stats.parsed);
    for (a, b) in serial.iter().zip(parallel.iter()) {
      assert_eq!(a.text(), b.text());
      assert_eq!(tree_of(a).flat(), tree_of(b).flat());
    }
  }

  #[test]
  fn leaves_expose_their_full_variant_sets() {
    let sentence = parse_one("Ása sá sól.");
    let tree = tree_of(&sentence);
    let verb = tree.leaves()[1];
    let variants = tree.all_variants(verb);
    // The terminal pins et and p3; the meaning adds tense, mood and voice.
    for expected in ["et", "p3", "þt", "fh", "gm"].iter() {
      assert!(variants.contains(expected), "missing {:?} in {:?}", expected, variants);
    }
    assert!(tree.all_variants(tree.root()).is_empty());
  }

  #[test]
  fn dump_round_trips_through_json() {
    let sentence = parse_one("Ása sá sól.");
    let dump = sentence.dump();
    let json = serde_json::to_string(&dump).unwrap();
    let back: Dump = serde_json::from_str(&json).unwrap();
    assert_eq!(back.text, "Ása sá sól .");
    assert_eq!(back.tokens.len(), 4);
    assert_eq!(back.terminals, vec!["no_et_nf_kvk", "so_1_þf_et_p3", "no_et_þf_kvk", "p"]);
    assert_eq!(back.tree, dump.tree);
    assert_eq!(back.score, dump.score);
    assert_eq!(back.error, None);
  }

  #[test]
  fn noun_phrases_reinflect() {
    let grammar = inflection_grammar();
    let lexicon = inflection_lexicon();
    let scores = Scores::default();
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let (sentences, _) = job.parse_text("tveir brimsaltir pokar af poppi");
    let tree = tree_of(&sentences[0]);
    let np = tree.first("NP").unwrap();
    assert_eq!(tree.inflected(np, THF, 0, &lexicon), "tvo brimsalta poka af poppi");
    assert_eq!(tree.inflected(np, THGF, 0, &lexicon), "tveimur brimsöltum pokum af poppi");
    assert_eq!(tree.nominative(np, &lexicon), "tveir brimsaltir pokar af poppi");
  }

  #[test]
  fn definite_noun_phrases_have_canonical_forms() {
    let (grammar, lexicon, scores) = (fragment_grammar(), fragment_lexicon(), fragment_scores());
    let job = Job::new(&grammar, &scores).with_lexicon(&lexicon);
    let (sentences, _) = job.parse_text("Litla gula hænan fann fræ.");
    let tree = tree_of(&sentences[0]);
    let subject = tree.first("NP-SUBJ").unwrap();
    assert_eq!(tree.nominative(subject, &lexicon), "Litla gula hænan");
    assert_eq!(tree.indefinite_nominative(subject, &lexicon), "Lítil gul hæna");
    assert_eq!(tree.canonical(subject, &lexicon), "Lítil gul hæna");
  }

  #[test]
  fn grammar_loads_behind_the_lock() {
    let grammar = load_grammar_locked(|| Ok(fragment_grammar())).unwrap();
    assert_eq!(grammar.name(grammar.start()), "S0");
    assert!(!Lock::path("greinir-grammar").exists());
  }
}
