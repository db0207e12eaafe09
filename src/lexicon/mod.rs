use crate::grammar::features::{Features, WordClass};
use crate::util::base::{Error, HashMap, Result};
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

pub mod format;
pub mod pack;
mod trie;

// The compressed inflectional lexicon: a packed radix tree over word forms
// in Latin-1, mapping each form to its meaning records. The buffer is
// validated once at load and never mutated; lookups are pure reads, so a
// single instance can serve any number of parses in parallel.

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Meaning {
  pub lemma: String,
  pub class: WordClass,
  pub features: Features,
  pub args: Option<Vec<Features>>,
}

pub struct Lexicon {
  data: Vec<u8>,
  header: format::Header,
  alphabet: Vec<u8>,
  to_index: [u8; 256],
  meaning_count: usize,
  variants: OnceCell<HashMap<(String, u8), Vec<(String, Features)>>>,
}

impl Lexicon {
  pub fn load(path: &std::path::Path) -> Result<Lexicon> {
    Lexicon::from_bytes(std::fs::read(path)?)
  }

  pub fn from_bytes(data: Vec<u8>) -> Result<Lexicon> {
    let corrupt = |x: &str| Error::CorruptLexicon(x.to_string());
    let header = format::Header::parse(&data)?;

    let alphabet_len =
      format::read_u32(&data, header.alphabet).ok_or_else(|| corrupt("truncated alphabet"))?;
    let alphabet = data
      .get(header.alphabet + 4..header.alphabet + 4 + alphabet_len as usize)
      .ok_or_else(|| corrupt("truncated alphabet"))?
      .to_vec();
    if alphabet.len() > format::CHAR_MASK as usize + 1 {
      return Err(corrupt("alphabet too large for the character index field"));
    }
    if alphabet.windows(2).any(|x| x[0] >= x[1]) {
      return Err(corrupt("alphabet is not sorted by byte order"));
    }
    let mut to_index = [0u8; 256];
    alphabet.iter().enumerate().for_each(|(i, x)| to_index[*x as usize] = i as u8 + 1);

    let meaning_count =
      format::read_u32(&data, header.meanings).ok_or_else(|| corrupt("truncated meanings"))?;
    let meaning_count = meaning_count as usize;
    let end = header.meanings + 4 + format::MEANING_SIZE * meaning_count;
    if end > data.len() {
      return Err(corrupt("truncated meanings"));
    }

    let forms = &data[header.forms..];
    format::validate(&data, &header, forms, alphabet.len(), meaning_count)?;

    let lexicon =
      Lexicon { data, header, alphabet, to_index, meaning_count, variants: OnceCell::new() };
    for i in 0..meaning_count {
      lexicon.meaning(i as u32).ok_or_else(|| corrupt("bad meaning record"))?;
    }
    Ok(lexicon)
  }

  pub fn alphabet(&self) -> &[u8] {
    &self.alphabet
  }

  // Meaning records for a form, in rank order (most frequent first). Unknown
  // forms, and strings outside the Latin-1 alphabet, yield an empty list.
  pub fn lookup(&self, form: &str) -> Vec<Meaning> {
    let value = match self.value_of(form) {
      Some(x) => x,
      None => return vec![],
    };
    let mut result = vec![];
    let mut off = self.header.mappings + 4 * value as usize;
    loop {
      let word = match format::read_u32(&self.data, off) {
        Some(x) => x,
        None => return result,
      };
      if let Some(meaning) = self.meaning(word & !format::MAPPING_LAST) {
        result.push(meaning);
      }
      if word & format::MAPPING_LAST != 0 {
        return result;
      }
      off += 4;
    }
  }

  pub fn contains(&self, form: &str) -> bool {
    self.value_of(form).is_some()
  }

  // All (form, meanings) entries, in byte order. Used to build the variants
  // index; a full walk, so callers should hold on to the result.
  pub fn entries(&self) -> Vec<(String, Vec<u32>)> {
    let forms = &self.data[self.header.forms..];
    let mut result = vec![];
    for (key, value) in trie::entries(forms) {
      let bytes: Vec<u8> = key.iter().map(|x| self.alphabet[*x as usize]).collect();
      let form = encoding_rs::mem::decode_latin1(&bytes).into_owned();
      let mut indices = vec![];
      let mut off = self.header.mappings + 4 * value as usize;
      while let Some(word) = format::read_u32(&self.data, off) {
        indices.push(word & !format::MAPPING_LAST);
        if word & format::MAPPING_LAST != 0 {
          break;
        }
        off += 4;
      }
      result.push((form, indices));
    }
    result
  }

  // Forms of a lemma that carry every requested feature, for noun-phrase
  // re-inflection. The reverse index is built once, on first use.
  pub fn lookup_variant(&self, lemma: &str, class: WordClass, features: Features) -> Vec<String> {
    let index = self.variants.get_or_init(|| {
      let mut result: HashMap<(String, u8), Vec<(String, Features)>> = HashMap::default();
      for (form, indices) in self.entries() {
        for i in indices {
          if let Some(meaning) = self.meaning(i) {
            let key = (meaning.lemma, meaning.class.code());
            result.entry(key).or_insert_with(Vec::new).push((form.clone(), meaning.features));
          }
        }
      }
      result
    });
    let forms = match index.get(&(lemma.to_string(), class.code())) {
      Some(x) => x,
      None => return vec![],
    };
    let mut result: Vec<(u32, String)> = vec![];
    for (form, mask) in forms {
      if mask & features == features && !result.iter().any(|(_, x)| x == form) {
        result.push(((mask & !features).count_ones(), form.clone()));
      }
    }
    // Forms carrying the fewest features beyond the requested ones first,
    // so "hæna" outranks "hænan" when the article is not asked for.
    result.sort_by(|a, b| a.0.cmp(&b.0));
    result.into_iter().map(|(_, x)| x).collect()
  }

  fn value_of(&self, form: &str) -> Option<u32> {
    if form.is_empty() || !encoding_rs::mem::is_str_latin1(form) {
      return None;
    }
    let bytes = encoding_rs::mem::encode_latin1_lossy(form);
    let mut key = Vec::with_capacity(bytes.len());
    for byte in bytes.iter() {
      match self.to_index[*byte as usize] {
        0 => return None,
        x => key.push(x - 1),
      }
    }
    trie::lookup(&self.data[self.header.forms..], &key)
  }

  fn meaning(&self, index: u32) -> Option<Meaning> {
    if index as usize >= self.meaning_count {
      return None;
    }
    let off = self.header.meanings + 4 + format::MEANING_SIZE * index as usize;
    let stem = format::read_u32(&self.data, off)?;
    let class = WordClass::from_code(format::read_u8(&self.data, off + 4)?)?;
    let argc = format::read_u8(&self.data, off + 5)?;
    let args = match argc {
      format::NO_ARGS => None,
      n if n <= 2 => {
        let mut cases = vec![];
        for i in 0..n {
          cases.push(pack::case_from_code(format::read_u8(&self.data, off + 6 + i as usize)?)?);
        }
        Some(cases)
      }
      _ => return None,
    };
    let features = format::read_u32(&self.data, off + 8)? as Features;
    Some(Meaning { lemma: self.stem(stem)?, class, features, args })
  }

  fn stem(&self, index: u32) -> Option<String> {
    let count = format::read_u32(&self.data, self.header.stems)?;
    if index >= count {
      return None;
    }
    let slot = format::read_u32(&self.data, self.header.stems + 4 + 4 * index as usize)?;
    let off = self.header.stems + slot as usize;
    let len = format::read_u8(&self.data, off)? as usize;
    let bytes = self.data.get(off + 1..off + 1 + len)?;
    Some(encoding_rs::mem::decode_latin1(bytes).into_owned())
  }
}

// The process-wide instance. Initialization is explicit and happens at most
// once between cleanups; cleanup drops the buffer once outstanding Arcs go
// away. Parsing never touches this slot implicitly.

static CURRENT: Lazy<Mutex<Option<Arc<Lexicon>>>> = Lazy::new(|| Mutex::new(None));

pub fn init(lexicon: Lexicon) -> Result<Arc<Lexicon>> {
  let mut slot = CURRENT.lock().map_err(|x| Error::Config(x.to_string()))?;
  if slot.is_some() {
    Err("Lexicon is already initialized; call cleanup first")?
  }
  let lexicon = Arc::new(lexicon);
  *slot = Some(Arc::clone(&lexicon));
  Ok(lexicon)
}

pub fn get() -> Option<Arc<Lexicon>> {
  CURRENT.lock().ok().and_then(|x| x.as_ref().map(Arc::clone))
}

pub fn cleanup() {
  if let Ok(mut slot) = CURRENT.lock() {
    *slot = None;
  }
}
