pub mod util;

pub mod forest;
pub mod grammar;
pub mod job;
pub mod lexicon;
pub mod matcher;
pub mod parser;
pub mod reducer;
pub mod settings;
pub mod tokens;
pub mod tree;

#[cfg(test)]
pub(crate) mod testgrammar;

pub use crate::grammar::{Grammar, Terminal, TerminalKind};
pub use crate::job::{Job, Sentence, Settings, Stats};
pub use crate::lexicon::{Lexicon, Meaning};
pub use crate::parser::ParseError;
pub use crate::settings::Scores;
pub use crate::tokens::{Tok, TokKind};
pub use crate::tree::SimpleTree;
pub use crate::util::base::{Error, Result};
