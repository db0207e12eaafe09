use crate::grammar::features::Features;
use crate::lexicon::{Lexicon, Meaning};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// The token model consumed by the matcher. The production tokenizer is an
// external collaborator that emits these records; the tokenize() adapter
// below covers the kinds that can be recognized from plain text alone, so
// that the job façade works end-to-end on raw strings.

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TokKind {
  Word,
  Number,
  Percent,
  Ordinal,
  Year,
  DateAbs,
  DateRel,
  Time,
  Timestamp,
  Amount,
  Currency,
  Url,
  Email,
  Domain,
  Hashtag,
  Person,
  Entity,
  Company,
  Street,
  Sequence,
  Punctuation,
  ParagraphBegin,
  ParagraphEnd,
  Unknown,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Payload {
  None,
  Number(f64),
  Percent(f64),
  Ordinal(u64),
  Year(i32),
  Date { year: i32, month: u32, day: u32 },
  Time { hour: u32, minute: u32, second: u32 },
  Amount { value: f64, currency: String },
  Person { gender: Option<Features> },
  Meanings(Vec<Meaning>),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tok {
  pub kind: TokKind,
  pub text: String,
  pub payload: Payload,
}

impl Tok {
  pub fn new(kind: TokKind, text: &str, payload: Payload) -> Tok {
    Tok { kind, text: text.to_string(), payload }
  }

  pub fn word(text: &str, meanings: Vec<Meaning>) -> Tok {
    Tok::new(TokKind::Word, text, Payload::Meanings(meanings))
  }

  pub fn punctuation(text: &str) -> Tok {
    Tok::new(TokKind::Punctuation, text, Payload::None)
  }

  pub fn meanings(&self) -> &[Meaning] {
    match &self.payload {
      Payload::Meanings(x) => x.as_slice(),
      _ => &[],
    }
  }

  pub fn ends_sentence(&self) -> bool {
    self.kind == TokKind::Punctuation && matches!(self.text.as_str(), "." | "!" | "?")
  }
}

static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\.$").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+(?:[.,][0-9]+)?$").unwrap());
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)%$").unwrap());
static AMOUNT: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)(kr\.?|ISK|EUR|USD|GBP)$").unwrap());
static TIME: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$").unwrap());
static DATE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{4})$").unwrap());
static EMAIL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w-]+(?:\.[\w-]+)+$").unwrap());
static DOMAIN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[\w-]+(?:\.[a-zA-Z]{2,})+$").unwrap());

const PUNCTUATION: &str = ".,:;!?()\u{ab}\u{bb}\u{201c}\u{201d}\u{2013}\u{2014}";

// A deliberately small bytes-to-tokens step. Word tokens are annotated with
// their lexicon meanings; a capitalized sentence-initial word falls back to
// its lowercase entry. Everything the adapter cannot recognize stays a word
// token with no meanings.

pub fn tokenize(text: &str, lexicon: Option<&Lexicon>) -> Vec<Tok> {
  let mut result = vec![];
  for piece in text.split_whitespace() {
    match piece {
      "[[" => result.push(Tok::new(TokKind::ParagraphBegin, piece, Payload::None)),
      "]]" => result.push(Tok::new(TokKind::ParagraphEnd, piece, Payload::None)),
      x => split_piece(x, lexicon, &mut result),
    }
  }
  result
}

fn split_piece(piece: &str, lexicon: Option<&Lexicon>, result: &mut Vec<Tok>) {
  if piece.is_empty() {
    return;
  }
  if let Some(tok) = classify(piece, lexicon) {
    result.push(tok);
    return;
  }
  let mut chars = piece.char_indices();
  if let Some((_, first)) = chars.next() {
    if PUNCTUATION.contains(first) {
      let rest = &piece[first.len_utf8()..];
      result.push(Tok::punctuation(&piece[..first.len_utf8()]));
      split_piece(rest, lexicon, result);
      return;
    }
  }
  if let Some((i, last)) = piece.char_indices().last() {
    if PUNCTUATION.contains(last) {
      split_piece(&piece[..i], lexicon, result);
      result.push(Tok::punctuation(&piece[i..]));
      return;
    }
  }
  result.push(word(piece, lexicon));
}

fn classify(piece: &str, lexicon: Option<&Lexicon>) -> Option<Tok> {
  if piece.chars().count() == 1 && PUNCTUATION.contains(piece.chars().next()?) {
    return Some(Tok::punctuation(piece));
  }
  if let Some(m) = PERCENT.captures(piece) {
    let value = m[1].replace(',', ".").parse().ok()?;
    return Some(Tok::new(TokKind::Percent, piece, Payload::Percent(value)));
  }
  if let Some(m) = AMOUNT.captures(piece) {
    let value = m[1].replace(',', ".").parse().ok()?;
    let currency = match &m[2] {
      "kr" | "kr." | "ISK" => "ISK".to_string(),
      x => x.to_string(),
    };
    return Some(Tok::new(TokKind::Amount, piece, Payload::Amount { value, currency }));
  }
  if let Some(m) = DATE.captures(piece) {
    let (day, month) = (m[1].parse().ok()?, m[2].parse().ok()?);
    let year = m[3].parse().ok()?;
    if (1..=31).contains(&day) && (1..=12).contains(&month) {
      return Some(Tok::new(TokKind::DateAbs, piece, Payload::Date { year, month, day }));
    }
    return None;
  }
  if let Some(m) = TIME.captures(piece) {
    let (hour, minute) = (m[1].parse().ok()?, m[2].parse().ok()?);
    let second = m.get(3).map_or(Some(0), |x| x.as_str().parse().ok())?;
    if hour < 24 && minute < 60 && second < 60 {
      return Some(Tok::new(TokKind::Time, piece, Payload::Time { hour, minute, second }));
    }
    return None;
  }
  if let Some(m) = ORDINAL.captures(piece) {
    let value = m[1].parse().ok()?;
    return Some(Tok::new(TokKind::Ordinal, piece, Payload::Ordinal(value)));
  }
  if NUMBER.is_match(piece) {
    let digits = piece.replace(',', ".");
    let value: f64 = digits.parse().ok()?;
    if piece.len() == 4 && (874.0..2200.0).contains(&value) {
      return Some(Tok::new(TokKind::Year, piece, Payload::Year(value as i32)));
    }
    return Some(Tok::new(TokKind::Number, piece, Payload::Number(value)));
  }
  if EMAIL.is_match(piece) {
    return Some(Tok::new(TokKind::Email, piece, Payload::None));
  }
  if DOMAIN.is_match(piece) {
    return Some(Tok::new(TokKind::Domain, piece, Payload::None));
  }
  if piece.chars().all(|x| x.is_alphabetic() || x == '-') {
    return Some(word(piece, lexicon));
  }
  None
}

fn word(piece: &str, lexicon: Option<&Lexicon>) -> Tok {
  let meanings = match lexicon {
    None => vec![],
    Some(lexicon) => {
      let meanings = lexicon.lookup(piece);
      if meanings.is_empty() && piece.chars().next().map_or(false, |x| x.is_uppercase()) {
        lexicon.lookup(&piece.to_lowercase())
      } else {
        meanings
      }
    }
  };
  Tok::word(piece, meanings)
}
