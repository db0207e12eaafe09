use crate::grammar::features::*;
use crate::grammar::Grammar;
use crate::lexicon::{pack::Packer, Lexicon, Meaning};
use crate::settings::Scores;

// A miniature Icelandic fragment shared by the integration tests: a handful
// of sentence productions in the style of the full grammar, a packed test
// lexicon with the word forms the scenarios use, and a matching scoring
// configuration. Nonterminal names follow the conventions of the real
// grammar; the public tags are registered on the survivors.

pub fn fragment_grammar() -> Grammar {
  let mut b = Grammar::builder("S0");
  b.tag("S0", "S0").unwrap();
  b.tag("Setning", "S-MAIN").unwrap();
  b.tag("Beygingarliður", "IP").unwrap();
  b.tag("Frumlag", "NP-SUBJ").unwrap();
  b.tag("SagnRuna", "VP").unwrap();
  b.tag("Sögn", "VP").unwrap();
  b.tag("Hjálparsögn", "VP-AUX").unwrap();
  b.tag("Sagnbót", "VP").unwrap();
  b.tag("Andlag", "NP-OBJ").unwrap();
  b.tag("ÓbeintAndlag", "NP-IOBJ").unwrap();
  b.tag("EignFt", "NP-POSS").unwrap();
  b.tag("FsLiður", "PP").unwrap();

  b.production("S0", &["Málsgrein"], 0).unwrap();
  b.production("Málsgrein", &["Setning", "grm"], 0).unwrap();
  b.production("Málsgrein", &["Setning"], 1).unwrap();
  b.production("Setning", &["Beygingarliður"], 0).unwrap();
  b.production("Beygingarliður", &["Frumlag", "SagnRuna"], 0).unwrap();

  b.production("Frumlag", &["NlNf"], 0).unwrap();
  b.production("Frumlag", &["NlÞgf"], 0).unwrap();
  b.production("NlNf", &["NlNfKjarni"], 0).unwrap();
  b.production("NlNf", &["LoNf", "NlNf"], 0).unwrap();
  b.production("NlNfKjarni", &["no_et_nf_kvk"], 0).unwrap();
  b.production("NlNfKjarni", &["no_et_nf_kk"], 0).unwrap();
  b.production("NlNfKjarni", &["no_et_nf_hk"], 0).unwrap();
  b.production("LoNf", &["lo_nf_et_kvk"], 0).unwrap();
  b.production("NlÞgf", &["LoÞgfFt", "NoÞgfFt"], 0).unwrap();
  b.production("LoÞgfFt", &["lo_þgf_ft_kvk"], 0).unwrap();
  b.production("NoÞgfFt", &["no_ft_þgf_kvk"], 0).unwrap();

  b.production("SagnRuna", &["Sögn", "Andlag"], 0).unwrap();
  b.production("SagnRuna", &["Sögn", "ÓbeintAndlag", "Andlag"], 0).unwrap();
  b.production("SagnRuna", &["Hjálparsögn", "Sagnbót"], 0).unwrap();
  // A prepositional phrase may attach to the verb phrase, at a lower
  // preference than attachment inside the object.
  b.production("SagnRuna", &["Sögn", "Andlag", "FsLiður"], 1).unwrap();
  b.production("Sögn", &["so_1_þf_et_p3"], 0).unwrap();
  b.production("Sögn", &["so_2_þgf_þf_et_p3"], 0).unwrap();
  b.production("Hjálparsögn", &["so_et_p3"], 0).unwrap();
  b.production("Sagnbót", &["so_sagnb"], 0).unwrap();

  b.production("Andlag", &["NlÞf"], 0).unwrap();
  b.production("NlÞf", &["no_et_þf_kvk"], 0).unwrap();
  b.production("NlÞf", &["no_et_þf_hk"], 0).unwrap();
  b.production("NlÞf", &["TalaLiður"], 0).unwrap();
  b.production("NlÞf", &["NlÞf", "FsLiður"], 0).unwrap();
  b.production("TalaLiður", &["tala_ft_þf_kvk", "no_ft_þf_kvk", "EignFt"], 0).unwrap();
  b.production("EignFt", &["no_ft_ef_kvk"], 0).unwrap();
  b.production("ÓbeintAndlag", &["no_et_þgf_kk"], 0).unwrap();
  b.production("FsLiður", &["fs_þgf", "no_et_þgf_kk"], 0).unwrap();
  b.freeze().unwrap()
}

fn meaning(lemma: &str, class: WordClass, features: Features) -> Meaning {
  Meaning { lemma: lemma.to_string(), class, features, args: None }
}

fn verb(lemma: &str, features: Features, args: &[Features]) -> Meaning {
  let args = Some(args.to_vec());
  Meaning { lemma: lemma.to_string(), class: WordClass::So, features, args }
}

pub fn fragment_lexicon() -> Lexicon {
  let mut p = Packer::new();
  let past = THT | FH | GM;
  p.add("Ása", meaning("Ása", WordClass::No, KVK | ET | NF)).unwrap();
  p.add("sá", verb("sjá", ET | P3 | past, &[THF])).unwrap();
  p.add("sá", meaning("sá", WordClass::Fn, KK | ET | NF)).unwrap();
  p.add("sól", meaning("sól", WordClass::No, KVK | ET | NF)).unwrap();
  p.add("sól", meaning("sól", WordClass::No, KVK | ET | THF)).unwrap();

  p.add("litla", meaning("lítill", WordClass::Lo, KVK | ET | NF | VB)).unwrap();
  p.add("litla", meaning("lítill", WordClass::Lo, KVK | ET | THF | VB)).unwrap();
  p.add("lítil", meaning("lítill", WordClass::Lo, KVK | ET | NF | SB)).unwrap();
  p.add("gula", meaning("gulur", WordClass::Lo, KVK | ET | NF | VB)).unwrap();
  p.add("gula", meaning("gulur", WordClass::Lo, KVK | ET | THF | VB)).unwrap();
  p.add("gul", meaning("gulur", WordClass::Lo, KVK | ET | NF | SB)).unwrap();
  p.add("hænan", meaning("hæna", WordClass::No, KVK | ET | NF | GR)).unwrap();
  p.add("hæna", meaning("hæna", WordClass::No, KVK | ET | NF)).unwrap();
  p.add("fann", verb("finna", ET | P3 | past, &[THF])).unwrap();
  p.add("fræ", meaning("fræ", WordClass::No, HK | ET | NF)).unwrap();
  p.add("fræ", meaning("fræ", WordClass::No, HK | ET | THF)).unwrap();

  p.add("Jón", meaning("Jón", WordClass::No, KK | ET | NF)).unwrap();
  p.add("greiddi", verb("greiða", ET | P3 | past, &[THGF, THF])).unwrap();
  p.add("greiddi", verb("greiða", ET | P3 | past, &[THF])).unwrap();
  p.add("bænum", meaning("bær", WordClass::No, KK | ET | THGF | GR)).unwrap();
  p.add("milljónir", meaning("milljón", WordClass::No, KVK | FT | NF)).unwrap();
  p.add("milljónir", meaning("milljón", WordClass::No, KVK | FT | THF)).unwrap();
  p.add("króna", meaning("króna", WordClass::No, KVK | ET | NF)).unwrap();
  p.add("króna", meaning("króna", WordClass::No, KVK | FT | EF)).unwrap();

  p.add("á", meaning("á", WordClass::Fs, THGF)).unwrap();
  p.add("himni", meaning("himinn", WordClass::No, KK | ET | THGF)).unwrap();

  p.add("seldum", meaning("seldur", WordClass::Lo, KVK | FT | THGF | SB)).unwrap();
  p.add("seldum", verb("selja", FT | P1 | past, &[THF])).unwrap();
  p.add("fasteignum", meaning("fasteign", WordClass::No, KVK | FT | THGF)).unwrap();
  p.add("hefur", verb("hafa", ET | P3 | NT | FH | GM, &[])).unwrap();
  p.add("fjölgað", verb("fjölga", SAGNB | GM, &[])).unwrap();
  Lexicon::from_bytes(p.pack().unwrap()).unwrap()
}

pub const FRAGMENT_CONFIG: &str = "
  # Scoring tables for the fragment grammar.

  $adjective_predicates:
  lemma    | case
  ---------|-----
  andvígur | sþgf

  $static_phrases:
  phrase
  ------
  að minnsta kosti

  $ambiguous_phrases:
  phrase
  ------
  að ráði

  $verbs:
  lemma  | cases
  -------|--------
  sjá    | þf
  finna  | þf
  greiða | þgf þf
  fjölga | 0
  hafa   | 0

  $prepositions:
  lemma | cases
  ------|------
  af    | þgf
  á     | þf þgf
";

pub fn fragment_scores() -> Scores {
  Scores::load(FRAGMENT_CONFIG).unwrap()
}

// A second, noun-phrase-only fixture for the re-inflection queries.

pub fn inflection_grammar() -> Grammar {
  let mut b = Grammar::builder("S0");
  b.tag("S0", "S0").unwrap();
  b.tag("NlFt", "NP").unwrap();
  b.tag("FsLiður", "PP").unwrap();
  b.production("S0", &["NlFt"], 0).unwrap();
  b.production("NlFt", &["to_ft_nf_kk", "lo_ft_nf_kk", "no_ft_nf_kk", "FsLiður"], 0).unwrap();
  b.production("FsLiður", &["fs_þgf", "no_et_þgf_hk"], 0).unwrap();
  b.freeze().unwrap()
}

pub fn inflection_lexicon() -> Lexicon {
  let mut p = Packer::new();
  p.add("tveir", meaning("tveir", WordClass::To, KK | FT | NF)).unwrap();
  p.add("tvo", meaning("tveir", WordClass::To, KK | FT | THF)).unwrap();
  p.add("tveimur", meaning("tveir", WordClass::To, KK | FT | THGF)).unwrap();
  p.add("brimsaltir", meaning("brimsaltur", WordClass::Lo, KK | FT | NF | SB)).unwrap();
  p.add("brimsalta", meaning("brimsaltur", WordClass::Lo, KK | FT | THF | SB)).unwrap();
  p.add("brimsöltum", meaning("brimsaltur", WordClass::Lo, KK | FT | THGF | SB)).unwrap();
  p.add("pokar", meaning("poki", WordClass::No, KK | FT | NF)).unwrap();
  p.add("poka", meaning("poki", WordClass::No, KK | FT | THF)).unwrap();
  p.add("pokum", meaning("poki", WordClass::No, KK | FT | THGF)).unwrap();
  p.add("af", meaning("af", WordClass::Fs, THGF)).unwrap();
  p.add("poppi", meaning("popp", WordClass::No, HK | ET | THGF)).unwrap();
  Lexicon::from_bytes(p.pack().unwrap()).unwrap()
}
