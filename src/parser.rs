use crate::forest::{Forest, NONE};
use crate::grammar::{Grammar, Sym};
use crate::matcher::Lattice;
use crate::util::base::HashMap;
use std::time::{Duration, Instant};

// The Earley chart parser with SPPF construction. An item is a dotted
// production with an origin column and a forest node for the part before
// the dot; items are deduplicated within a column by (production, dot,
// origin), which is packed into one integer with the production's cursor
// base index. The wanted table maps (column, nonterminal) to the items
// ending at that column that predict the nonterminal next, so completion
// never rescans a column. Null completions within the current column are
// short-circuited at prediction time through the nullable table.
//
// The forest comes out binarized: advancing a dot combines the node before
// the dot with the newly recognized child, interning an intermediate node
// for proper prefixes and a symbol node when the production completes.
// Re-derivations of an interned node attach as extra families.

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
  Failure(usize),
  TooLong(usize),
  Timeout(u64),
  Foreign(u32),
}

impl std::fmt::Display for ParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      ParseError::Failure(x) => write!(f, "no parse; first stall at token {}", x),
      ParseError::TooLong(x) => write!(f, "sentence has {} tokens; over the limit", x),
      ParseError::Timeout(x) => write!(f, "parse timed out after {} ms", x),
      ParseError::Foreign(x) => write!(f, "sentence looks foreign ({}% known words)", x),
    }
  }
}

pub struct Limits {
  pub max_tokens: usize,
  pub timeout: Option<Duration>,
}

impl Default for Limits {
  fn default() -> Limits {
    Limits { max_tokens: 90, timeout: None }
  }
}

pub fn parse(
  grammar: &Grammar,
  lattice: &Lattice,
  limits: &Limits,
) -> std::result::Result<Forest, ParseError> {
  let n = lattice.len();
  if limits.max_tokens > 0 && n > limits.max_tokens {
    return Err(ParseError::TooLong(n));
  }
  let started = Instant::now();
  let mut chart = Chart::new(grammar, lattice);
  for production in grammar.productions_of(grammar.start()) {
    chart.add_item(*production, 0, 0, NONE);
  }
  chart.fill_column();
  for k in 0..n {
    if let Some(timeout) = limits.timeout {
      if started.elapsed() >= timeout {
        return Err(ParseError::Timeout(started.elapsed().as_millis() as u64));
      }
    }
    chart.scan_into_next_column(k);
    if chart.current.is_empty() {
      log::debug!("chart stalled at token {} of {}", k, n);
      return Err(ParseError::Failure(k));
    }
    chart.fill_column();
  }
  let mut forest = chart.forest;
  match forest.find_symbol(grammar.start(), 0, n as u32) {
    Some(root) => {
      forest.set_root(root);
      log::debug!("parsed {} tokens into {} forest nodes", n, forest.len());
      Ok(forest)
    }
    None => Err(ParseError::Failure(n.saturating_sub(1))),
  }
}

#[derive(Clone, Copy)]
struct Item {
  prod: u32,
  dot: u16,
  origin: u32,
  node: u32,
}

struct Chart<'a> {
  grammar: &'a Grammar,
  lattice: &'a Lattice,
  forest: Forest,
  items: Vec<Item>,
  wanted: HashMap<u64, Vec<u32>>,
  current: Vec<u32>,
  lookup: HashMap<u64, u32>,
  nullable: HashMap<u32, u32>,
  scannable: Vec<u32>,
  position: u32,
}

impl<'a> Chart<'a> {
  fn new(grammar: &'a Grammar, lattice: &'a Lattice) -> Chart<'a> {
    Chart {
      grammar,
      lattice,
      forest: Forest::new(),
      items: vec![],
      wanted: HashMap::default(),
      current: vec![],
      lookup: HashMap::default(),
      nullable: HashMap::default(),
      scannable: vec![],
      position: 0,
    }
  }

  fn add_item(&mut self, prod: u32, dot: u16, origin: u32, node: u32) {
    let base = self.grammar.production(prod).index;
    let key = origin as u64 * self.grammar.max_index() as u64 + (base + dot as usize) as u64;
    if self.lookup.contains_key(&key) {
      return;
    }
    let index = self.items.len() as u32;
    self.items.push(Item { prod, dot, origin, node });
    self.lookup.insert(key, index);
    self.current.push(index);
  }

  fn fill_column(&mut self) {
    let mut i = 0;
    while i < self.current.len() {
      let index = self.current[i];
      let item = self.items[index as usize];
      i += 1;
      let production = self.grammar.production(item.prod);
      if item.dot as usize == production.rhs.len() {
        self.complete(item);
      } else {
        match production.rhs[item.dot as usize] {
          Sym::Nt(nt) => self.predict(index, nt),
          Sym::T(_) => self.scannable.push(index),
        }
      }
    }
    if log::log_enabled!(log::Level::Trace) {
      log::trace!("{}", self.dump_column());
    }
  }

  fn scan_into_next_column(&mut self, k: usize) {
    let scannable = std::mem::replace(&mut self.scannable, vec![]);
    self.position += 1;
    self.current.clear();
    self.lookup.clear();
    self.nullable.clear();
    for index in scannable {
      let item = self.items[index as usize];
      if let Sym::T(t) = self.grammar.production(item.prod).rhs[item.dot as usize] {
        if self.lattice.get(k, t).is_some() {
          let leaf = self.forest.leaf(t, k as u32);
          self.advance(index, leaf);
        }
      }
    }
  }

  fn complete(&mut self, item: Item) {
    let production = self.grammar.production(item.prod);
    let node = if item.node == NONE {
      // An empty production completing over an empty span: the symbol node
      // gets a single epsilon family.
      let epsilon = self.forest.epsilon(self.position);
      let symbol = self.forest.symbol(production.lhs, self.position, self.position);
      self.forest.add_family(symbol, item.prod, NONE, epsilon);
      symbol
    } else {
      item.node
    };
    if item.origin == self.position {
      self.nullable.entry(production.lhs).or_insert(node);
    }
    let key = self.wanted_key(item.origin, production.lhs);
    if let Some(parents) = self.wanted.get(&key).cloned() {
      for parent in parents {
        self.advance(parent, node);
      }
    }
  }

  fn predict(&mut self, index: u32, nt: u32) {
    if let Some(node) = self.nullable.get(&nt).cloned() {
      self.advance(index, node);
    }
    let key = self.wanted_key(self.position, nt);
    let fresh = !self.wanted.contains_key(&key);
    self.wanted.entry(key).or_insert_with(Vec::new).push(index);
    if fresh {
      for production in self.grammar.productions_of(nt) {
        self.add_item(*production, 0, self.position, NONE);
      }
    }
  }

  fn advance(&mut self, index: u32, child: u32) {
    let item = self.items[index as usize];
    let dot = item.dot + 1;
    let node = self.make_node(item.prod, dot, item.origin, item.node, child);
    self.add_item(item.prod, dot, item.origin, node);
  }

  // Scott & Johnstone's MakeNode: a symbol node once the production is
  // complete, the bare child while the prefix has length one, and an
  // interned intermediate node for longer prefixes.
  fn make_node(&mut self, prod: u32, dot: u16, origin: u32, before: u32, child: u32) -> u32 {
    let production = self.grammar.production(prod);
    let end = self.forest.node(child).end;
    if dot as usize == production.rhs.len() {
      let symbol = self.forest.symbol(production.lhs, origin, end);
      self.forest.add_family(symbol, prod, before, child);
      symbol
    } else if dot == 1 {
      child
    } else {
      let interm = self.forest.interm(prod, dot, origin, end);
      self.forest.add_family(interm, prod, before, child);
      interm
    }
  }

  fn wanted_key(&self, column: u32, nt: u32) -> u64 {
    column as u64 * self.grammar.num_nonterminals() as u64 + nt as u64
  }

  fn dump_column(&self) -> String {
    let items = self.current.iter().map(|x| {
      let item = self.items[*x as usize];
      let production = self.grammar.production(item.prod);
      let mut rhs: Vec<String> = production
        .rhs
        .iter()
        .map(|y| match y {
          Sym::Nt(nt) => self.grammar.name(*nt).to_string(),
          Sym::T(t) => self.grammar.terminal(*t).name.clone(),
        })
        .collect();
      rhs.insert(item.dot as usize, "\u{25cf}".to_string());
      format!("{} -> {}, from: {}", self.grammar.name(production.lhs), rhs.join(" "), item.origin)
    });
    let items = items.collect::<Vec<_>>().join("\n");
    format!("column {}\n{}", self.position, items)
  }
}
