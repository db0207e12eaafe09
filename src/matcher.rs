use crate::grammar::features::{self, Features, WordClass};
use crate::grammar::{Grammar, Terminal, TerminalKind};
use crate::lexicon::Meaning;
use crate::settings::Scores;
use crate::tokens::{Payload, Tok, TokKind};
use crate::util::base::{HashMap, HashSet};

// The tokens-to-terminals layer. For every input position the lattice holds
// the set of terminals the token can realize, each annotated with the
// meaning that justified the match and a base score. When several meanings
// justify the same terminal only the best-scoring one is kept; the reducer
// later sums these base scores along a derivation.

#[derive(Clone, Debug)]
pub struct Match {
  pub meaning: Option<Meaning>,
  pub score: i32,
}

pub struct Lattice {
  positions: Vec<HashMap<u32, Match>>,
}

impl Lattice {
  pub fn len(&self) -> usize {
    self.positions.len()
  }

  pub fn get(&self, pos: usize, terminal: u32) -> Option<&Match> {
    self.positions.get(pos).and_then(|x| x.get(&terminal))
  }

  pub fn is_dead_end(&self, pos: usize) -> bool {
    self.positions[pos].is_empty()
  }
}

pub fn build(grammar: &Grammar, tokens: &[Tok], scores: &Scores) -> Lattice {
  let adjustments = phrase_adjustments(tokens, scores);
  let mut positions = Vec::with_capacity(tokens.len());
  for (pos, token) in tokens.iter().enumerate() {
    let mut matches: HashMap<u32, Match> = HashMap::default();
    for (id, terminal) in grammar.terminals().iter().enumerate() {
      if let Some(found) = match_terminal(terminal, token, pos, scores, &adjustments) {
        let slot = matches.entry(id as u32).or_insert_with(|| found.clone());
        if slot.score < found.score {
          *slot = found;
        }
      }
    }
    log::trace!("token {} {:?}: {} terminal matches", pos, token.text, matches.len());
    positions.push(matches);
  }
  Lattice { positions }
}

fn match_terminal(
  terminal: &Terminal,
  token: &Tok,
  pos: usize,
  scores: &Scores,
  adjustments: &HashMap<(usize, String), i32>,
) -> Option<Match> {
  match &terminal.kind {
    TerminalKind::Text(text) => {
      if token.text.to_lowercase() == *text {
        Some(Match { meaning: None, score: scores.literal })
      } else {
        None
      }
    }
    TerminalKind::Typed(kind) => match_typed(terminal, *kind, token, scores),
    TerminalKind::Class(_) | TerminalKind::Lemma(_) => {
      if token.kind != TokKind::Word {
        return None;
      }
      if token.meanings().is_empty() {
        return match_unknown(terminal, scores);
      }
      let mut best: Option<Match> = None;
      for (rank, meaning) in token.meanings().iter().enumerate() {
        if !terminal.matches_meaning(meaning) {
          continue;
        }
        let mut score = match &terminal.kind {
          TerminalKind::Lemma(_) => scores.literal,
          _ => scores.class_base(meaning.class),
        };
        score -= rank as i32 * scores.rank_step;
        score += features::count(terminal.variants) as i32 * scores.specificity;
        score += lemma_adjustments(terminal, meaning, scores);
        score += adjustments.get(&(pos, meaning.lemma.to_lowercase())).cloned().unwrap_or(0);
        if best.as_ref().map_or(true, |x| x.score < score) {
          best = Some(Match { meaning: Some(meaning.clone()), score });
        }
      }
      best
    }
  }
}

fn match_typed(terminal: &Terminal, kind: TokKind, token: &Tok, scores: &Scores) -> Option<Match> {
  if token.kind != kind {
    return None;
  }
  match &token.payload {
    // Numeric terminals agree in number with the numeral's value; case and
    // gender variants are settled by the surrounding grammar.
    Payload::Number(value) => {
      let singular = *value == 1.0 || *value == -1.0;
      if terminal.variants & features::ET != 0 && !singular {
        return None;
      }
      if terminal.variants & features::FT != 0 && singular {
        return None;
      }
    }
    Payload::Person { gender } => {
      let required = terminal.variants & features::GENDERS;
      if required != 0 && gender.map_or(true, |x| x & required != required) {
        return None;
      }
    }
    _ => {}
  }
  Some(Match { meaning: None, score: scores.typed_token })
}

// A word the lexicon does not know can still be read as a proper-name
// entity, at a configured penalty proportional to its use.
fn match_unknown(terminal: &Terminal, scores: &Scores) -> Option<Match> {
  match &terminal.kind {
    TerminalKind::Class(WordClass::No) if terminal.variants & features::GR == 0 => {
      Some(Match { meaning: None, score: -scores.unknown_word - scores.entity_choice })
    }
    _ => None,
  }
}

fn lemma_adjustments(terminal: &Terminal, meaning: &Meaning, scores: &Scores) -> i32 {
  let mut score = 0;
  if meaning.class == WordClass::So {
    if let (Some(args), Some(frames)) =
      (&meaning.args, scores.verb_frames.get(&meaning.lemma.to_lowercase()))
    {
      if frames.contains(args) {
        score += scores.verb_frame;
      } else {
        score -= scores.verb_mismatch;
      }
    }
  }
  if meaning.class == WordClass::Fs {
    if let Some(governed) = scores.prepositions.get(&meaning.lemma.to_lowercase()) {
      let required = terminal.variants & features::CASES;
      if required != 0 && governed & required == required {
        score += scores.preposition;
      } else if required != 0 {
        score -= scores.preposition;
      }
    }
  }
  if meaning.class == WordClass::Lo {
    if let Some(case) = scores.adjective_predicates.get(&meaning.lemma.to_lowercase()) {
      let governed = features::STHF | features::STHGF | features::SEF;
      let required = terminal.variants & governed;
      if required != 0 && case & required == required {
        score += scores.adjective_predicate;
      }
    }
  }
  score
}

// Fixed idioms outweigh their word-by-word decompositions, and known
// ambiguity traps are penalized. A phrase applies at a position when every
// following token can carry the phrase's lemma at its offset.
fn phrase_adjustments(tokens: &[Tok], scores: &Scores) -> HashMap<(usize, String), i32> {
  let mut result = HashMap::default();
  if scores.static_phrases.is_empty() && scores.ambiguous_phrases.is_empty() {
    return result;
  }
  let lemmas: Vec<HashSet<String>> = tokens
    .iter()
    .map(|x| x.meanings().iter().map(|y| y.lemma.to_lowercase()).collect())
    .collect();
  let phrases = scores
    .static_phrases
    .iter()
    .map(|x| (x, scores.static_phrase))
    .chain(scores.ambiguous_phrases.iter().map(|x| (x, -scores.ambiguous_phrase)));
  for (phrase, adjustment) in phrases {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.len() < 2 || words.len() > tokens.len() {
      continue;
    }
    for start in 0..=tokens.len() - words.len() {
      let hit = words.iter().enumerate().all(|(i, x)| lemmas[start + i].contains(*x));
      if hit {
        for (i, word) in words.iter().enumerate() {
          *result.entry((start + i, word.to_string())).or_insert(0) += adjustment;
        }
      }
    }
  }
  result
}
