use crate::forest::{Family, Forest, NodeKind, NONE};
use crate::grammar::Grammar;
use crate::matcher::Lattice;
use crate::settings::Scores;

// The forest reducer walks the SPPF once, post-order and memoized, scoring
// every node and recording the winning family at each ambiguity. A family's
// score is the sum of its children's scores; terminal leaves contribute the
// base match scores the lattice already carries. Ties between families of a
// symbol node go to the production with the lower priority value, so the
// chosen derivation is always score-maximal and priorities only ever break
// exact ties. Combination counts are aggregated alongside for the
// per-sentence ambiguity statistic.

pub struct Reduction {
  pub score: i64,
  pub combinations: u64,
  pub packed_nodes: u32,
  pub max_families: u32,
  choices: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Deriv {
  Node { prod: u32, children: Vec<Deriv> },
  Leaf { terminal: u32, token: u32 },
}

pub fn reduce(grammar: &Grammar, forest: &Forest, lattice: &Lattice, scores: &Scores) -> Reduction {
  let mut packed_nodes = 0;
  let mut max_families = 0;
  for i in 0..forest.len() as u32 {
    let families = forest.node(i).families.len() as u32;
    if families > 1 {
      packed_nodes += 1;
    }
    max_families = max_families.max(families);
  }
  let mut state = State {
    grammar,
    forest,
    lattice,
    scores,
    cells: vec![Cell::Untouched; forest.len()],
    choices: vec![NONE; forest.len()],
  };
  let (score, combinations, choices) = match forest.root() {
    None => (0, 0, vec![]),
    Some(root) => match state.score(root) {
      None => (0, 0, state.choices),
      Some((score, combinations)) => (score, combinations, state.choices),
    },
  };
  Reduction { score, combinations, packed_nodes, max_families, choices }
}

// Rebuild the chosen derivation as a plain tree. The binarized left spine
// of each family unwinds into the production's child list.
pub fn extract(forest: &Forest, reduction: &Reduction) -> Option<Deriv> {
  let root = forest.root()?;
  extract_node(forest, reduction, root)
}

#[derive(Clone, Copy, PartialEq)]
enum Cell {
  Untouched,
  InProgress,
  Done(i64, u64),
}

struct State<'a> {
  grammar: &'a Grammar,
  forest: &'a Forest,
  lattice: &'a Lattice,
  scores: &'a Scores,
  cells: Vec<Cell>,
  choices: Vec<u32>,
}

impl<'a> State<'a> {
  fn score(&mut self, index: u32) -> Option<(i64, u64)> {
    match self.cells[index as usize] {
      Cell::Done(score, combinations) => return Some((score, combinations)),
      Cell::InProgress => return None,
      Cell::Untouched => {}
    }
    self.cells[index as usize] = Cell::InProgress;
    let node = self.forest.node(index);
    let result = match node.kind {
      NodeKind::Leaf { terminal } => {
        let score = self.lattice.get(node.start as usize, terminal).map_or(0, |x| x.score);
        Some((score as i64, 1))
      }
      NodeKind::Epsilon => Some((self.scores.null_production as i64, 1)),
      NodeKind::Symbol { .. } | NodeKind::Interm { .. } => self.score_families(index),
    };
    if let Some((score, combinations)) = result {
      self.cells[index as usize] = Cell::Done(score, combinations);
    } else {
      self.cells[index as usize] = Cell::Untouched;
    }
    result
  }

  fn score_families(&mut self, index: u32) -> Option<(i64, u64)> {
    let families = self.forest.node(index).families.clone();
    let mut best: Option<(i64, i32, u32)> = None;
    let mut combinations: u64 = 0;
    for (i, family) in families.iter().enumerate() {
      let (left, left_combinations) = match family.left {
        NONE => (0, 1),
        x => match self.score(x) {
          Some(y) => y,
          None => continue,
        },
      };
      let (right, right_combinations) = match self.score(family.right) {
        Some(x) => x,
        None => continue,
      };
      let score = left + right;
      let priority = self.grammar.production(family.prod).priority;
      combinations =
        combinations.saturating_add(left_combinations.saturating_mul(right_combinations));
      let wins = match best {
        None => true,
        Some((s, p, _)) => score > s || (score == s && priority < p),
      };
      if wins {
        best = Some((score, priority, i as u32));
      }
    }
    let (score, _, choice) = best?;
    self.choices[index as usize] = choice;
    Some((score, combinations))
  }
}

fn extract_node(forest: &Forest, reduction: &Reduction, index: u32) -> Option<Deriv> {
  let node = forest.node(index);
  match node.kind {
    NodeKind::Leaf { terminal } => Some(Deriv::Leaf { terminal, token: node.start }),
    NodeKind::Epsilon => None,
    NodeKind::Interm { .. } => None,
    NodeKind::Symbol { .. } => {
      let choice = *reduction.choices.get(index as usize)?;
      let family = node.families.get(choice as usize)?;
      let mut children = vec![];
      unwind(forest, reduction, family, &mut children)?;
      children.reverse();
      let mut result = Vec::with_capacity(children.len());
      for child in children {
        if let Some(x) = extract_node(forest, reduction, child) {
          result.push(x);
        }
      }
      Some(Deriv::Node { prod: family.prod, children: result })
    }
  }
}

fn unwind(
  forest: &Forest,
  reduction: &Reduction,
  family: &Family,
  out: &mut Vec<u32>,
) -> Option<()> {
  let right = forest.node(family.right);
  if right.kind != NodeKind::Epsilon {
    out.push(family.right);
  }
  match family.left {
    NONE => Some(()),
    left => match forest.node(left).kind {
      NodeKind::Interm { .. } => {
        let choice = *reduction.choices.get(left as usize)?;
        let next = forest.node(left).families.get(choice as usize)?;
        unwind(forest, reduction, next, out)
      }
      _ => {
        out.push(left);
        Some(())
      }
    },
  }
}
