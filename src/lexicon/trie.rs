use super::format::{Fragment, Node};

// Radix-tree traversal over the packed forms region. The key is a sequence
// of alphabet indices; the return value is the node's 23-bit value field (a
// mappings offset) on an exact match. Children are binary-searched by their
// first character, so each node costs at most log2(children) probes.

pub fn lookup(forms: &[u8], key: &[u8]) -> Option<u32> {
  let mut node = Node::at(forms, 0)?;
  let mut rest = key;
  loop {
    let fragment = node.fragment()?;
    if !fragment.matches(rest) && !(rest.is_empty() && fragment.len() == 0) {
      return None;
    }
    rest = &rest[fragment.len()..];
    if rest.is_empty() {
      return node.value();
    }
    node = descend(forms, &node, rest[0])?;
  }
}

fn descend<'a>(forms: &'a [u8], node: &Node<'a>, target: u8) -> Option<Node<'a>> {
  let count = node.child_count()?;
  let (mut lo, mut hi) = (0, count);
  while lo < hi {
    let mid = (lo + hi) / 2;
    let child = Node::at(forms, node.child_offset(mid)?)?;
    let first = child.first_char()?;
    if first == target {
      return Some(child);
    } else if first < target {
      lo = mid + 1;
    } else {
      hi = mid;
    }
  }
  None
}

// Depth-first enumeration of every (key, value) pair in the trie, used to
// build the inflection index. Keys come out in sorted order.

pub fn entries(forms: &[u8]) -> Vec<(Vec<u8>, u32)> {
  let mut result = vec![];
  let mut prefix = vec![];
  if let Some(root) = Node::at(forms, 0) {
    walk(forms, &root, &mut prefix, &mut result);
  }
  result
}

fn walk(forms: &[u8], node: &Node, prefix: &mut Vec<u8>, result: &mut Vec<(Vec<u8>, u32)>) {
  let depth = prefix.len();
  match node.fragment() {
    Some(Fragment::Single(x)) => prefix.push(x),
    Some(Fragment::Slice(x)) => prefix.extend_from_slice(x),
    None => return,
  }
  if let Some(value) = node.value() {
    result.push((prefix.clone(), value));
  }
  for i in 0..node.child_count().unwrap_or(0) {
    if let Some(child) = node.child_offset(i).and_then(|x| Node::at(forms, x)) {
      walk(forms, &child, prefix, result);
    }
  }
  prefix.truncate(depth);
}
