use super::format;
use super::Meaning;
use crate::grammar::features::{self, Features};
use crate::util::base::{HashMap, Result};

// The write side of the lexicon binary. Takes (form, meaning) entries in
// rank order (earlier meanings for a form are the more frequent ones) and
// emits a buffer in the format described in format.rs. This is how test
// lexicons are built and how raw morphology tables get migrated.

pub struct Packer {
  entries: Vec<(String, Vec<u32>)>,
  by_form: HashMap<Vec<u8>, usize>,
  meanings: Vec<Meaning>,
  by_meaning: HashMap<Meaning, u32>,
}

impl Packer {
  pub fn new() -> Self {
    let (entries, by_form) = (vec![], HashMap::default());
    Self { entries, by_form, meanings: vec![], by_meaning: HashMap::default() }
  }

  pub fn add(&mut self, form: &str, meaning: Meaning) -> Result<()> {
    if !encoding_rs::mem::is_str_latin1(form) || form.is_empty() {
      Err(format!("Form is not representable in the alphabet: {:?}", form))?
    }
    let key = encoding_rs::mem::encode_latin1_lossy(form).into_owned();
    let index = match self.by_meaning.get(&meaning) {
      Some(x) => *x,
      None => {
        let index = self.meanings.len() as u32;
        self.meanings.push(meaning.clone());
        self.by_meaning.insert(meaning, index);
        index
      }
    };
    let slot = match self.by_form.get(&key) {
      Some(x) => *x,
      None => {
        let slot = self.entries.len();
        self.entries.push((form.to_string(), vec![]));
        self.by_form.insert(key, slot);
        slot
      }
    };
    let runs = &mut self.entries[slot].1;
    if !runs.contains(&index) {
      runs.push(index);
    }
    Ok(())
  }

  pub fn pack(&self) -> Result<Vec<u8>> {
    if self.entries.is_empty() {
      Err("Cannot pack an empty lexicon")?
    }

    // The alphabet is exactly the set of bytes used by the forms.
    let mut used = [false; 256];
    let mut keys: Vec<(Vec<u8>, &[u32])> = Vec::with_capacity(self.entries.len());
    for (form, meanings) in &self.entries {
      let bytes = encoding_rs::mem::encode_latin1_lossy(form).into_owned();
      bytes.iter().for_each(|x| used[*x as usize] = true);
      keys.push((bytes, meanings));
    }
    let alphabet: Vec<u8> = (0..256).filter(|x| used[*x as usize]).map(|x| x as u8).collect();
    if alphabet.len() > format::CHAR_MASK as usize + 1 {
      Err(format!("Alphabet has {} characters; the limit is 128", alphabet.len()))?
    }
    let mut to_index = [0u8; 256];
    alphabet.iter().enumerate().for_each(|(i, x)| to_index[*x as usize] = i as u8);
    keys.iter_mut().for_each(|(k, _)| k.iter_mut().for_each(|x| *x = to_index[*x as usize]));
    keys.sort();

    // Mappings: one run per form, in sorted form order so that the trie's
    // value fields can be assigned during a single build pass.
    let mut mappings: Vec<u32> = vec![];
    let mut values: HashMap<&[u8], u32> = HashMap::default();
    for (key, meanings) in &keys {
      let offset = mappings.len() as u32;
      if offset >= format::NO_VALUE {
        Err("Mappings region exceeds the 23-bit value field")?
      }
      values.insert(key.as_slice(), offset);
      for (i, index) in meanings.iter().enumerate() {
        let last = if i + 1 == meanings.len() { format::MAPPING_LAST } else { 0 };
        mappings.push(*index | last);
      }
    }

    // Stems and meanings tables.
    let mut stems: Vec<String> = vec![];
    let mut stem_index: HashMap<&str, u32> = HashMap::default();
    for meaning in &self.meanings {
      if !stem_index.contains_key(meaning.lemma.as_str()) {
        stem_index.insert(meaning.lemma.as_str(), stems.len() as u32);
        stems.push(meaning.lemma.clone());
      }
    }

    let trie = build_trie(&keys, &values)?;
    let forms = serialize_trie(&trie)?;

    let mut data = Vec::with_capacity(forms.len() + 16 * self.entries.len());
    data.extend_from_slice(format::SIGNATURE);
    data.extend_from_slice(&[0u8; 20]);

    let alphabet_off = data.len();
    push_u32(&mut data, alphabet.len() as u32);
    data.extend_from_slice(&alphabet);

    let forms_off = data.len();
    data.extend_from_slice(&forms);

    let mappings_off = data.len();
    mappings.iter().for_each(|x| push_u32(&mut data, *x));

    let stems_off = data.len();
    push_u32(&mut data, stems.len() as u32);
    let mut cursor = 4 + 4 * stems.len();
    for stem in &stems {
      push_u32(&mut data, cursor as u32);
      cursor += 1 + encoding_rs::mem::encode_latin1_lossy(stem).len();
    }
    for stem in &stems {
      let bytes = encoding_rs::mem::encode_latin1_lossy(stem);
      data.push(bytes.len() as u8);
      data.extend_from_slice(&bytes);
    }

    let meanings_off = data.len();
    push_u32(&mut data, self.meanings.len() as u32);
    for meaning in &self.meanings {
      push_u32(&mut data, stem_index[meaning.lemma.as_str()]);
      data.push(meaning.class.code());
      match &meaning.args {
        None => data.extend_from_slice(&[format::NO_ARGS, format::NO_ARGS, format::NO_ARGS]),
        Some(args) => {
          if args.len() > 2 {
            Err(format!("Meaning of {} has {} arguments; the limit is 2", meaning.lemma, args.len()))?
          }
          data.push(args.len() as u8);
          for i in 0..2 {
            data.push(args.get(i).and_then(|x| case_code(*x)).unwrap_or(format::NO_ARGS));
          }
        }
      }
      push_u32(&mut data, meaning.features as u32);
    }

    for (i, off) in
      [mappings_off, forms_off, stems_off, meanings_off, alphabet_off].iter().enumerate()
    {
      data[16 + 4 * i..20 + 4 * i].copy_from_slice(&(*off as u32).to_le_bytes());
    }
    Ok(data)
  }
}

pub fn case_code(case: Features) -> Option<u8> {
  match case {
    features::NF => Some(0),
    features::THF => Some(1),
    features::THGF => Some(2),
    features::EF => Some(3),
    _ => None,
  }
}

pub fn case_from_code(code: u8) -> Option<Features> {
  match code {
    0 => Some(features::NF),
    1 => Some(features::THF),
    2 => Some(features::THGF),
    3 => Some(features::EF),
    _ => None,
  }
}

// An in-memory radix tree over alphabet indices, built from the sorted key
// list and compressed so that every interim chain becomes one fragment.

struct Build {
  children: Vec<(u8, usize)>,
  fragment: Vec<u8>,
  value: u32,
}

fn build_trie(keys: &[(Vec<u8>, &[u32])], values: &HashMap<&[u8], u32>) -> Result<Vec<Build>> {
  let root = Build { children: vec![], fragment: vec![], value: format::NO_VALUE };
  let mut nodes = vec![root];
  for (key, _) in keys {
    let mut node = 0;
    let mut rest: &[u8] = key;
    loop {
      if rest.is_empty() {
        nodes[node].value = values[key.as_slice()];
        break;
      }
      let next = nodes[node].children.iter().find(|(x, _)| *x == rest[0]).map(|(_, x)| *x);
      match next {
        None => {
          let fresh = Build { children: vec![], fragment: rest.to_vec(), value: values[key.as_slice()] };
          nodes.push(fresh);
          let index = nodes.len() - 1;
          nodes[node].children.push((rest[0], index));
          nodes[node].children.sort();
          break;
        }
        Some(child) => {
          let shared =
            nodes[child].fragment.iter().zip(rest.iter()).take_while(|(a, b)| a == b).count();
          if shared < nodes[child].fragment.len() {
            // Split the child's fragment at the shared prefix.
            let tail = nodes[child].fragment.split_off(shared);
            let moved = Build {
              children: std::mem::replace(&mut nodes[child].children, vec![]),
              fragment: tail.clone(),
              value: std::mem::replace(&mut nodes[child].value, format::NO_VALUE),
            };
            nodes.push(moved);
            let index = nodes.len() - 1;
            nodes[child].children.push((tail[0], index));
          }
          rest = &rest[shared..];
          node = child;
        }
      }
    }
  }
  Ok(nodes)
}

fn node_size(nodes: &[Build], i: usize) -> usize {
  let node = &nodes[i];
  let children = if node.children.is_empty() { 0 } else { 1 + 4 * node.children.len() };
  let single = i != 0 && node.fragment.len() == 1;
  let fragment = if single { 0 } else { 1 + node.fragment.len() };
  4 + children + fragment
}

fn subtree_size(nodes: &[Build], i: usize) -> usize {
  node_size(nodes, i) + nodes[i].children.iter().map(|(_, x)| subtree_size(nodes, *x)).sum::<usize>()
}

fn serialize_trie(nodes: &[Build]) -> Result<Vec<u8>> {
  let mut out = vec![];
  serialize_node(nodes, 0, 0, &mut out)?;
  Ok(out)
}

fn serialize_node(nodes: &[Build], i: usize, off: usize, out: &mut Vec<u8>) -> Result<()> {
  let node = &nodes[i];
  let single = i != 0 && node.fragment.len() == 1;
  let childless = node.children.is_empty();
  let mut header = node.value & format::VALUE_MASK;
  if single {
    header |= format::FLAG_SINGLE | ((node.fragment[0] as u32) << format::CHAR_SHIFT);
  }
  if childless {
    header |= format::FLAG_CHILDLESS;
  }
  push_u32(out, header);
  if !childless {
    out.push(node.children.len() as u8);
    let mut child_off = off + node_size(nodes, i);
    for (_, child) in &node.children {
      if child_off > format::VALUE_MASK as usize {
        Err("Forms trie exceeds the addressable node range")?
      }
      push_u32(out, child_off as u32);
      child_off += subtree_size(nodes, *child);
    }
  }
  if !single {
    out.push(node.fragment.len() as u8);
    out.extend_from_slice(&node.fragment);
  }
  for (_, child) in &node.children {
    serialize_node(nodes, *child, out.len(), out)?;
  }
  Ok(())
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
  out.extend_from_slice(&value.to_le_bytes());
}
