use crate::grammar::features::{self, Features, WordClass};
use crate::util::base::{HashMap, HashSet, Result};
use crate::{for_each_row, for_each_table};

// The scoring configuration: scalar weights plus the lemma tables that bias
// the reducer toward idiomatic readings. An explicit value with no global
// state; the matcher bakes the per-match scores into the lattice and the
// reducer only ever adds them up. The exact numbers are tuning knobs; the
// tests rely on orderings, not on the values themselves.

pub struct Scores {
  pub rank_step: i32,
  pub specificity: i32,
  pub typed_token: i32,
  pub literal: i32,
  pub unknown_word: i32,
  pub entity_choice: i32,
  pub rare_class: i32,
  pub null_production: i32,
  pub verb_frame: i32,
  pub verb_mismatch: i32,
  pub preposition: i32,
  pub adjective_predicate: i32,
  pub static_phrase: i32,
  pub ambiguous_phrase: i32,
  pub adjective_predicates: HashMap<String, Features>,
  pub static_phrases: HashSet<String>,
  pub ambiguous_phrases: HashSet<String>,
  pub verb_frames: HashMap<String, Vec<Vec<Features>>>,
  pub prepositions: HashMap<String, Features>,
}

impl Default for Scores {
  fn default() -> Self {
    Scores {
      rank_step: 2,
      specificity: 3,
      typed_token: 5,
      literal: 10,
      unknown_word: 20,
      entity_choice: 10,
      rare_class: 4,
      null_production: 0,
      verb_frame: 8,
      verb_mismatch: 6,
      preposition: 4,
      adjective_predicate: 5,
      static_phrase: 12,
      ambiguous_phrase: 8,
      adjective_predicates: HashMap::default(),
      static_phrases: HashSet::default(),
      ambiguous_phrases: HashSet::default(),
      verb_frames: HashMap::default(),
      prepositions: HashMap::default(),
    }
  }
}

impl Scores {
  // Baseline score of reading a token as a given word class. Common open
  // classes rank above the closed ones; interjections come last.
  pub fn class_base(&self, class: WordClass) -> i32 {
    match class {
      WordClass::No | WordClass::So => 6,
      WordClass::Lo => 5,
      WordClass::Fs | WordClass::Ao | WordClass::To | WordClass::Tol => 4,
      WordClass::Fn | WordClass::Pfn | WordClass::Gr | WordClass::St | WordClass::Nhm => 3,
      WordClass::Eo | WordClass::Abfn | WordClass::Stt => 3 - self.rare_class,
      WordClass::Uh => 1 - self.rare_class,
    }
  }

  // Parse the five configuration tables. The file is a $NAME:-sectioned
  // pipe-delimited table list; see util::table for the cell syntax.
  pub fn load(text: &str) -> Result<Scores> {
    let mut scores = Scores::default();
    for_each_table!(
      text,
      [adjective_predicates, static_phrases, ambiguous_phrases, verbs, prepositions],
      {
        for_each_row!(adjective_predicates, [lemma, case], {
          let mask = parse_cases(&case, features::STHF | features::STHGF | features::SEF)?;
          scores.adjective_predicates.insert(lemma, mask);
        });
        for_each_row!(static_phrases, [phrase], {
          scores.static_phrases.insert(phrase);
        });
        for_each_row!(ambiguous_phrases, [phrase], {
          scores.ambiguous_phrases.insert(phrase);
        });
        for_each_row!(verbs, [lemma, cases], {
          let frame = if cases == "0" {
            vec![]
          } else {
            let mut frame = vec![];
            for case in cases.split_whitespace() {
              frame.push(parse_cases(case, features::CASES)?);
            }
            frame
          };
          scores.verb_frames.entry(lemma).or_insert_with(Vec::new).push(frame);
        });
        for_each_row!(prepositions, [lemma, cases], {
          let mut mask = 0;
          for case in cases.split_whitespace() {
            mask |= parse_cases(case, features::CASES)?;
          }
          scores.prepositions.insert(lemma, mask);
        });
      }
    );
    Ok(scores)
  }
}

fn parse_cases(name: &str, allowed: Features) -> Result<Features> {
  match features::parse(name) {
    Some(x) if x & allowed == x => Ok(x),
    _ => Err(format!("Bad case {:?} in configuration table", name))?,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CONFIG: &str = "
    $adjective_predicates:
    lemma   | case
    --------|-----
    afhuga  | sþgf
    andvígur| sþgf
    auðugur | sef

    $static_phrases:
    phrase
    ------
    að minnsta kosti
    á hinn bóginn

    $ambiguous_phrases:
    phrase
    ------
    að ráði

    $verbs:
    lemma   | cases
    --------|--------
    sjá     | þf
    greiða  | þgf þf
    greiða  | þf
    fjölga  | 0

    $prepositions:
    lemma | cases
    ------|------
    af    | þgf
    á     | þf þgf
  ";

  #[test]
  fn tables_load_into_config() {
    let scores = Scores::load(CONFIG).unwrap();
    assert_eq!(scores.adjective_predicates["afhuga"], features::STHGF);
    assert_eq!(scores.adjective_predicates["auðugur"], features::SEF);
    assert!(scores.static_phrases.contains("að minnsta kosti"));
    assert!(scores.ambiguous_phrases.contains("að ráði"));
    assert_eq!(scores.verb_frames["sjá"], vec![vec![features::THF]]);
    assert_eq!(
      scores.verb_frames["greiða"],
      vec![vec![features::THGF, features::THF], vec![features::THF]],
    );
    assert_eq!(scores.verb_frames["fjölga"], vec![Vec::<Features>::new()]);
    assert_eq!(scores.prepositions["af"], features::THGF);
    assert_eq!(scores.prepositions["á"], features::THF | features::THGF);
  }

  #[test]
  fn bad_cases_are_rejected() {
    let config = "
      $adjective_predicates:
      lemma  | case
      -------|-----
      afhuga | þgf
    ";
    let config = format!(
      "{}\n$static_phrases:\nphrase\n---\nx\n$ambiguous_phrases:\nphrase\n---\nx\n\
       $verbs:\nlemma | cases\n---|---\nsjá | þf\n$prepositions:\nlemma | cases\n---|---\naf | þgf",
      config
    );
    assert!(Scores::load(&config).is_err());
  }

  #[test]
  fn class_baselines_penalize_rare_classes() {
    let scores = Scores::default();
    assert!(scores.class_base(WordClass::No) > scores.class_base(WordClass::Fn));
    assert!(scores.class_base(WordClass::Fn) > scores.class_base(WordClass::Stt));
    assert!(scores.class_base(WordClass::Stt) > scores.class_base(WordClass::Uh));
  }
}
