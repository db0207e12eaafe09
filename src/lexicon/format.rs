use crate::util::base::{Error, Result};

// The lexicon binary is a single buffer with a fixed header and four
// cross-referenced tables. All integers are little-endian.
//
//   0..16   signature
//   16..36  five u32 offsets: mappings, forms, stems, meanings, alphabet
//
//   alphabet  u32 length, then the alphabet's Latin-1 bytes in byte order
//   forms     packed radix-tree node stream; offsets relative to the region
//   mappings  u32 runs; bit 31 ends a run, bits 0..30 hold a meaning index
//   stems     u32 count, count u32 record offsets, then (u8 len, bytes)
//   meanings  u32 count, then 12-byte records:
//             u32 stem index, u8 word class, u8 argument count (0xFF none),
//             u8 arg case 0, u8 arg case 1, u32 feature bits
//
// A trie node is a u32 header followed by an optional child array and an
// optional fragment. Bit 31 marks a single-character node whose alphabet
// index sits in bits 23..30; bit 30 marks a childless node; bits 0..22 hold
// the value (a word offset into the mappings region) or the all-ones
// sentinel for interim nodes. Multi-character nodes store their fragment
// (alphabet indices) right after the child array: u8 length, then bytes.
// Children are u32 node offsets sorted by first fragment character.

pub const SIGNATURE: &[u8; 16] = b"greinir-lexicon\0";

pub const FLAG_SINGLE: u32 = 1 << 31;
pub const FLAG_CHILDLESS: u32 = 1 << 30;
pub const CHAR_SHIFT: u32 = 23;
pub const CHAR_MASK: u32 = 0x7F;
pub const VALUE_MASK: u32 = 0x7F_FFFF;
pub const NO_VALUE: u32 = VALUE_MASK;

pub const MAPPING_LAST: u32 = 1 << 31;
pub const MEANING_SIZE: usize = 12;
pub const NO_ARGS: u8 = 0xFF;

pub fn read_u8(data: &[u8], off: usize) -> Option<u8> {
  data.get(off).cloned()
}

pub fn read_u32(data: &[u8], off: usize) -> Option<u32> {
  let bytes = data.get(off..off.checked_add(4)?)?;
  Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

// Bounds-checked view of one trie node. Every accessor returns None instead
// of reading outside the forms region; the load-time walk (validate below)
// proves that lookups over a validated buffer never hit that path.

#[derive(Clone, Copy)]
pub struct Node<'a> {
  forms: &'a [u8],
  header: u32,
  off: usize,
}

impl<'a> Node<'a> {
  pub fn at(forms: &'a [u8], off: usize) -> Option<Node<'a>> {
    let header = read_u32(forms, off)?;
    Some(Node { forms, header, off })
  }

  pub fn single(&self) -> bool {
    self.header & FLAG_SINGLE != 0
  }

  pub fn childless(&self) -> bool {
    self.header & FLAG_CHILDLESS != 0
  }

  pub fn value(&self) -> Option<u32> {
    let value = self.header & VALUE_MASK;
    if value == NO_VALUE {
      None
    } else {
      Some(value)
    }
  }

  pub fn char_index(&self) -> u8 {
    ((self.header >> CHAR_SHIFT) & CHAR_MASK) as u8
  }

  pub fn child_count(&self) -> Option<usize> {
    if self.childless() {
      Some(0)
    } else {
      read_u8(self.forms, self.off + 4).map(|x| x as usize)
    }
  }

  pub fn child_offset(&self, i: usize) -> Option<usize> {
    if self.childless() || i >= self.child_count()? {
      return None;
    }
    read_u32(self.forms, self.off + 5 + 4 * i).map(|x| x as usize)
  }

  // The fragment as alphabet indices. Single-character nodes keep their one
  // character in the header; the root has an empty fragment.
  pub fn fragment(&self) -> Option<Fragment<'a>> {
    if self.single() {
      return Some(Fragment::Single(self.char_index()));
    }
    let base = if self.childless() { self.off + 4 } else { self.off + 5 + 4 * self.child_count()? };
    let len = read_u8(self.forms, base)? as usize;
    self.forms.get(base + 1..base + 1 + len).map(Fragment::Slice)
  }

  pub fn first_char(&self) -> Option<u8> {
    match self.fragment()? {
      Fragment::Single(x) => Some(x),
      Fragment::Slice(x) => x.first().cloned(),
    }
  }
}

pub enum Fragment<'a> {
  Single(u8),
  Slice(&'a [u8]),
}

impl<'a> Fragment<'a> {
  pub fn len(&self) -> usize {
    match self {
      Fragment::Single(_) => 1,
      Fragment::Slice(x) => x.len(),
    }
  }

  pub fn matches(&self, key: &[u8]) -> bool {
    match self {
      Fragment::Single(x) => key.first() == Some(x),
      Fragment::Slice(x) => key.len() >= x.len() && &key[..x.len()] == *x,
    }
  }
}

pub struct Header {
  pub mappings: usize,
  pub forms: usize,
  pub stems: usize,
  pub meanings: usize,
  pub alphabet: usize,
}

impl Header {
  pub fn parse(data: &[u8]) -> Result<Header> {
    let corrupt = |x: &str| Error::CorruptLexicon(x.to_string());
    if data.len() < 36 || &data[0..16] != SIGNATURE {
      return Err(corrupt("bad signature"));
    }
    let offset = |i: usize| read_u32(data, 16 + 4 * i).map(|x| x as usize);
    let header = Header {
      mappings: offset(0).ok_or_else(|| corrupt("truncated header"))?,
      forms: offset(1).ok_or_else(|| corrupt("truncated header"))?,
      stems: offset(2).ok_or_else(|| corrupt("truncated header"))?,
      meanings: offset(3).ok_or_else(|| corrupt("truncated header"))?,
      alphabet: offset(4).ok_or_else(|| corrupt("truncated header"))?,
    };
    for x in [header.mappings, header.forms, header.stems, header.meanings, header.alphabet].iter()
    {
      if *x < 36 || *x > data.len() {
        return Err(corrupt("table offset out of bounds"));
      }
    }
    Ok(header)
  }
}

// Full structural validation, run once at load. Walks the whole trie and
// every cross-reference so that lookup never has to handle corruption.

pub fn validate(
  data: &[u8],
  header: &Header,
  forms: &[u8],
  alphabet_len: usize,
  meaning_count: usize,
) -> Result<()> {
  let corrupt = |x: String| Error::CorruptLexicon(x);
  let mut stack = vec![(0usize, 0usize)];
  while let Some((off, depth)) = stack.pop() {
    if depth > forms.len() {
      return Err(corrupt("cycle in forms trie".to_string()));
    }
    let node =
      Node::at(forms, off).ok_or_else(|| corrupt(format!("node at {} out of bounds", off)))?;
    let fragment =
      node.fragment().ok_or_else(|| corrupt(format!("fragment at {} out of bounds", off)))?;
    if off != 0 && fragment.len() == 0 {
      return Err(corrupt(format!("empty fragment at {}", off)));
    }
    if let Fragment::Slice(x) = fragment {
      if x.iter().any(|y| *y as usize >= alphabet_len) {
        return Err(corrupt(format!("fragment character out of alphabet at {}", off)));
      }
    }
    if node.single() && node.char_index() as usize >= alphabet_len {
      return Err(corrupt(format!("character out of alphabet at {}", off)));
    }
    if let Some(value) = node.value() {
      validate_mapping(data, header, value as usize, meaning_count)?;
    }
    let count = node.child_count().ok_or_else(|| corrupt(format!("bad child count at {}", off)))?;
    let mut last_char = None;
    for i in 0..count {
      let child =
        node.child_offset(i).ok_or_else(|| corrupt(format!("bad child array at {}", off)))?;
      if child <= off {
        return Err(corrupt(format!("non-forward child offset at {}", off)));
      }
      let first = Node::at(forms, child)
        .and_then(|x| x.first_char())
        .ok_or_else(|| corrupt(format!("bad child node at {}", child)))?;
      if last_char.map_or(false, |x| x >= first) {
        return Err(corrupt(format!("unsorted children at {}", off)));
      }
      last_char = Some(first);
      stack.push((child, depth + 1));
    }
  }
  Ok(())
}

fn validate_mapping(
  data: &[u8],
  header: &Header,
  value: usize,
  meaning_count: usize,
) -> Result<()> {
  let corrupt = |x: String| Error::CorruptLexicon(x);
  let mut off = header.mappings + 4 * value;
  loop {
    let word =
      read_u32(data, off).ok_or_else(|| corrupt(format!("mapping at {} out of bounds", off)))?;
    let index = (word & !MAPPING_LAST) as usize;
    if index >= meaning_count {
      return Err(corrupt(format!("meaning index {} out of range", index)));
    }
    if word & MAPPING_LAST != 0 {
      return Ok(());
    }
    off += 4;
  }
}
