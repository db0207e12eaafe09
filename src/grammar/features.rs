use crate::util::base::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// The closed vocabulary of morphosyntactic variants. A feature set is a
// bitmask; terminals require a subset of the features carried by a meaning
// record. The verb argument specs (so_0, so_1_þf, so_2_þgf_þf) are not
// features and live on terminals and meanings as explicit case lists.

pub type Features = u64;

pub const NF: Features = 1 << 0; // nominative
pub const THF: Features = 1 << 1; // accusative (þf)
pub const THGF: Features = 1 << 2; // dative (þgf)
pub const EF: Features = 1 << 3; // genitive
pub const ET: Features = 1 << 4; // singular
pub const FT: Features = 1 << 5; // plural
pub const KK: Features = 1 << 6; // masculine
pub const KVK: Features = 1 << 7; // feminine
pub const HK: Features = 1 << 8; // neuter
pub const P1: Features = 1 << 9;
pub const P2: Features = 1 << 10;
pub const P3: Features = 1 << 11;
pub const NH: Features = 1 << 12; // infinitive
pub const FH: Features = 1 << 13; // indicative
pub const BH: Features = 1 << 14; // imperative
pub const VH: Features = 1 << 15; // subjunctive
pub const LH: Features = 1 << 16; // present participle
pub const LHTHT: Features = 1 << 17; // past participle (lhþt)
pub const SAGNB: Features = 1 << 18; // supine
pub const GM: Features = 1 << 19; // active voice
pub const MM: Features = 1 << 20; // middle voice
pub const NT: Features = 1 << 21; // present tense
pub const THT: Features = 1 << 22; // past tense (þt)
pub const MST: Features = 1 << 23; // comparative
pub const ESB: Features = 1 << 24; // superlative, strong
pub const EVB: Features = 1 << 25; // superlative, weak
pub const STHF: Features = 1 << 26; // governs accusative (sþf)
pub const STHGF: Features = 1 << 27; // governs dative (sþgf)
pub const SEF: Features = 1 << 28; // governs genitive
pub const SB: Features = 1 << 29; // strong declension
pub const VB: Features = 1 << 30; // weak declension
pub const GR: Features = 1 << 31; // suffixed definite article

pub const CASES: Features = NF | THF | THGF | EF;
pub const NUMBERS: Features = ET | FT;
pub const GENDERS: Features = KK | KVK | HK;
pub const PERSONS: Features = P1 | P2 | P3;

// Names in canonical order; describe() lists a mask in this order so that
// descriptors come out stable.

const NAMES: &[(&str, Features)] = &[
  ("nf", NF),
  ("þf", THF),
  ("þgf", THGF),
  ("ef", EF),
  ("et", ET),
  ("ft", FT),
  ("kk", KK),
  ("kvk", KVK),
  ("hk", HK),
  ("p1", P1),
  ("p2", P2),
  ("p3", P3),
  ("nh", NH),
  ("fh", FH),
  ("bh", BH),
  ("vh", VH),
  ("lh", LH),
  ("lhþt", LHTHT),
  ("sagnb", SAGNB),
  ("gm", GM),
  ("mm", MM),
  ("nt", NT),
  ("þt", THT),
  ("mst", MST),
  ("esb", ESB),
  ("evb", EVB),
  ("sþf", STHF),
  ("sþgf", STHGF),
  ("sef", SEF),
  ("sb", SB),
  ("vb", VB),
  ("gr", GR),
];

static BY_NAME: Lazy<HashMap<&'static str, Features>> =
  Lazy::new(|| NAMES.iter().cloned().collect());

pub fn parse(name: &str) -> Option<Features> {
  BY_NAME.get(name).cloned()
}

pub fn parse_case(name: &str) -> Option<Features> {
  parse(name).filter(|x| x & CASES != 0)
}

pub fn describe(mask: Features) -> Vec<&'static str> {
  NAMES.iter().filter(|(_, x)| mask & x != 0).map(|(name, _)| *name).collect()
}

pub fn count(mask: Features) -> u32 {
  mask.count_ones()
}

// Word classes, as found in the lexicon's meaning records and as the heads of
// word-class terminal names. The u8 codes are the on-disk encoding in the
// meanings table.

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum WordClass {
  #[serde(rename = "no")]
  No, // noun
  #[serde(rename = "so")]
  So, // verb
  #[serde(rename = "lo")]
  Lo, // adjective
  #[serde(rename = "fs")]
  Fs, // preposition
  #[serde(rename = "ao")]
  Ao, // adverb
  #[serde(rename = "eo")]
  Eo, // qualifying adverb
  #[serde(rename = "fn")]
  Fn, // pronoun
  #[serde(rename = "pfn")]
  Pfn, // personal pronoun
  #[serde(rename = "abfn")]
  Abfn, // reflexive pronoun
  #[serde(rename = "gr")]
  Gr, // article
  #[serde(rename = "st")]
  St, // conjunction
  #[serde(rename = "stt")]
  Stt, // relative conjunction
  #[serde(rename = "nhm")]
  Nhm, // infinitive marker
  #[serde(rename = "to")]
  To, // declinable numeral
  #[serde(rename = "töl")]
  Tol, // indeclinable numeral
  #[serde(rename = "uh")]
  Uh, // interjection
}

const CLASSES: &[(&str, WordClass)] = &[
  ("no", WordClass::No),
  ("so", WordClass::So),
  ("lo", WordClass::Lo),
  ("fs", WordClass::Fs),
  ("ao", WordClass::Ao),
  ("eo", WordClass::Eo),
  ("fn", WordClass::Fn),
  ("pfn", WordClass::Pfn),
  ("abfn", WordClass::Abfn),
  ("gr", WordClass::Gr),
  ("st", WordClass::St),
  ("stt", WordClass::Stt),
  ("nhm", WordClass::Nhm),
  ("to", WordClass::To),
  ("töl", WordClass::Tol),
  ("uh", WordClass::Uh),
];

impl WordClass {
  pub fn from_name(name: &str) -> Option<WordClass> {
    CLASSES.iter().find(|(x, _)| *x == name).map(|(_, x)| *x)
  }

  pub fn from_code(code: u8) -> Option<WordClass> {
    CLASSES.get(code as usize).map(|(_, x)| *x)
  }

  pub fn code(self) -> u8 {
    CLASSES.iter().position(|(_, x)| *x == self).unwrap_or(0) as u8
  }

  pub fn name(self) -> &'static str {
    CLASSES.iter().find(|(_, x)| *x == self).map(|(x, _)| *x).unwrap_or("no")
  }

  // A word-class terminal may be more general than the meaning's class:
  // plain adverb terminals also take qualifying adverbs, and indeclinable
  // numeral terminals also take declinable ones.
  pub fn covers(self, other: WordClass) -> bool {
    if self == other {
      return true;
    }
    match self {
      WordClass::Ao => other == WordClass::Eo,
      WordClass::Tol => other == WordClass::To,
      WordClass::Fn => other == WordClass::Pfn,
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_round_trip() {
    for (name, mask) in NAMES {
      assert_eq!(parse(name), Some(*mask));
      assert_eq!(describe(*mask), vec![*name]);
    }
    assert_eq!(parse("xx"), None);
  }

  #[test]
  fn describe_is_ordered() {
    assert_eq!(describe(KVK | ET | NF), vec!["nf", "et", "kvk"]);
    assert_eq!(describe(THT | P3 | THF), vec!["þf", "p3", "þt"]);
  }

  #[test]
  fn case_parsing_rejects_non_cases() {
    assert_eq!(parse_case("þgf"), Some(THGF));
    assert_eq!(parse_case("et"), None);
  }

  #[test]
  fn class_codes_round_trip() {
    for (name, class) in CLASSES {
      assert_eq!(WordClass::from_name(name), Some(*class));
      assert_eq!(WordClass::from_code(class.code()), Some(*class));
      assert_eq!(class.name(), *name);
    }
    assert_eq!(WordClass::from_code(200), None);
  }

  #[test]
  fn coverage_is_reflexive_and_directed() {
    assert!(WordClass::Ao.covers(WordClass::Eo));
    assert!(!WordClass::Eo.covers(WordClass::Ao));
    assert!(WordClass::Tol.covers(WordClass::To));
    assert!(WordClass::Fn.covers(WordClass::Pfn));
    assert!(WordClass::So.covers(WordClass::So));
    assert!(!WordClass::So.covers(WordClass::No));
  }
}
