pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

pub type Result<T> = std::result::Result<T, Error>;

// The crate-wide error type covers load-time failures only: corrupt on-disk
// artifacts, bad configuration tables, I/O, and a held compile lock. Outcomes
// of parsing a single sentence are ordinary values (parser::ParseError) and
// never travel through this type.

pub enum Error {
  Config(String),
  CorruptGrammar(String),
  CorruptLexicon(String),
  Io(String),
  LockHeld(std::path::PathBuf),
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Error::Config(x) => write!(f, "{}", x),
      Error::CorruptGrammar(x) => write!(f, "Corrupt grammar: {}", x),
      Error::CorruptLexicon(x) => write!(f, "Corrupt lexicon: {}", x),
      Error::Io(x) => write!(f, "I/O error: {}", x),
      Error::LockHeld(x) => write!(f, "Lock held: {} (delete the file to recover)", x.display()),
    }
  }
}

impl std::fmt::Debug for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self)
  }
}

impl From<String> for Error {
  fn from(x: String) -> Error {
    Error::Config(x)
  }
}

impl From<&str> for Error {
  fn from(x: &str) -> Error {
    Error::Config(x.to_string())
  }
}

impl From<std::io::Error> for Error {
  fn from(x: std::io::Error) -> Error {
    Error::Io(x.to_string())
  }
}
