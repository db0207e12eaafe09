use crate::util::base::{Error, HashMap, Result};

pub mod features;
pub mod terminal;

pub use terminal::{Terminal, TerminalKind};

// The in-memory grammar: interned nonterminals and terminals, productions
// with priorities, and the indexes the chart parser needs. Construction goes
// through the builder; freeze() validates the grammar, computes the nullable
// set, and assigns each production its cursor base index. A frozen grammar
// is immutable and shared read-only by every parse.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sym {
  Nt(u32),
  T(u32),
}

#[derive(Debug)]
pub struct Production {
  pub lhs: u32,
  pub rhs: Vec<Sym>,
  pub priority: i32,
  pub index: usize,
}

pub struct Grammar {
  names: Vec<String>,
  tags: Vec<Option<String>>,
  terminals: Vec<Terminal>,
  productions: Vec<Production>,
  by_lhs: Vec<Vec<u32>>,
  nullable: Vec<bool>,
  start: u32,
  max_index: usize,
}

impl Grammar {
  pub fn builder(start: &str) -> Builder {
    let mut builder = Builder {
      names: vec![],
      name_index: HashMap::default(),
      tags: vec![],
      terminals: vec![],
      terminal_index: HashMap::default(),
      productions: vec![],
      start: start.to_string(),
    };
    builder.nonterminal(start);
    builder
  }

  pub fn start(&self) -> u32 {
    self.start
  }

  pub fn name(&self, nt: u32) -> &str {
    &self.names[nt as usize]
  }

  pub fn tag(&self, nt: u32) -> Option<&str> {
    self.tags[nt as usize].as_deref()
  }

  pub fn terminal(&self, t: u32) -> &Terminal {
    &self.terminals[t as usize]
  }

  pub fn terminals(&self) -> &[Terminal] {
    &self.terminals
  }

  pub fn num_nonterminals(&self) -> usize {
    self.names.len()
  }

  pub fn production(&self, p: u32) -> &Production {
    &self.productions[p as usize]
  }

  pub fn productions_of(&self, nt: u32) -> &[u32] {
    &self.by_lhs[nt as usize]
  }

  pub fn nullable(&self, nt: u32) -> bool {
    self.nullable[nt as usize]
  }

  // One more than the largest production cursor key; used to pack
  // (origin, production, dot) triples into a single integer.
  pub fn max_index(&self) -> usize {
    self.max_index
  }
}

pub struct Builder {
  names: Vec<String>,
  name_index: HashMap<String, u32>,
  tags: Vec<Option<String>>,
  terminals: Vec<Terminal>,
  terminal_index: HashMap<String, u32>,
  productions: Vec<(u32, Vec<Sym>, i32)>,
  start: String,
}

impl Builder {
  // Register the public simplification tag of a nonterminal. Nonterminals
  // without a tag are collapsed into their parents by the simplifier.
  pub fn tag(&mut self, nt: &str, tag: &str) -> Result<()> {
    if !crate::tree::TAGS.contains(&tag) {
      Err(Error::CorruptGrammar(format!("Unknown simplification tag: {:?}", tag)))?
    }
    let nt = self.nonterminal(nt);
    self.tags[nt as usize] = Some(tag.to_string());
    Ok(())
  }

  // Add a production. Right-hand-side names starting with an uppercase
  // letter are nonterminals; everything else is parsed as a terminal name.
  pub fn production(&mut self, lhs: &str, rhs: &[&str], priority: i32) -> Result<()> {
    let lhs = self.nonterminal(lhs);
    let mut symbols = Vec::with_capacity(rhs.len());
    for name in rhs {
      if name.chars().next().map_or(false, |x| x.is_uppercase()) {
        symbols.push(Sym::Nt(self.nonterminal(name)));
      } else {
        symbols.push(Sym::T(self.terminal(name)?));
      }
    }
    self.productions.push((lhs, symbols, priority));
    Ok(())
  }

  pub fn freeze(self) -> Result<Grammar> {
    let start = self.name_index[&self.start];
    let mut productions = vec![];
    let mut by_lhs: Vec<Vec<u32>> = self.names.iter().map(|_| vec![]).collect();
    let mut index = 0;
    for (i, (lhs, rhs, priority)) in self.productions.into_iter().enumerate() {
      by_lhs[lhs as usize].push(i as u32);
      let production = Production { lhs, rhs, priority, index };
      index += production.rhs.len() + 1;
      productions.push(production);
    }
    for (nt, rules) in by_lhs.iter().enumerate() {
      if rules.is_empty() {
        let name = &self.names[nt];
        Err(Error::CorruptGrammar(format!("Nonterminal {} has no productions", name)))?
      }
    }
    let nullable = compute_nullable(&self.names, &productions);
    Ok(Grammar {
      names: self.names,
      tags: self.tags,
      terminals: self.terminals,
      productions,
      by_lhs,
      nullable,
      start,
      max_index: index,
    })
  }

  fn nonterminal(&mut self, name: &str) -> u32 {
    if let Some(x) = self.name_index.get(name) {
      return *x;
    }
    let index = self.names.len() as u32;
    self.names.push(name.to_string());
    self.tags.push(None);
    self.name_index.insert(name.to_string(), index);
    index
  }

  fn terminal(&mut self, name: &str) -> Result<u32> {
    if let Some(x) = self.terminal_index.get(name) {
      return Ok(*x);
    }
    let index = self.terminals.len() as u32;
    self.terminals.push(Terminal::parse(name)?);
    self.terminal_index.insert(name.to_string(), index);
    Ok(index)
  }
}

fn compute_nullable(names: &[String], productions: &[Production]) -> Vec<bool> {
  let mut nullable = vec![false; names.len()];
  loop {
    let mut changed = false;
    for production in productions {
      if nullable[production.lhs as usize] {
        continue;
      }
      let all = production.rhs.iter().all(|x| match x {
        Sym::Nt(nt) => nullable[*nt as usize],
        Sym::T(_) => false,
      });
      if all {
        nullable[production.lhs as usize] = true;
        changed = true;
      }
    }
    if !changed {
      return nullable;
    }
  }
}
