use super::base::{Error, Result};
use std::path::PathBuf;

// An advisory lock file guarding grammar compilation. The lock is a plain
// file created with create_new under the OS temp directory; holding it means
// the file exists. A crash can leave the file behind, so the path is
// well-known and deleting it by hand is the documented recovery step.

pub struct Lock {
  path: PathBuf,
}

impl Lock {
  pub fn path(name: &str) -> PathBuf {
    std::env::temp_dir().join(name)
  }

  pub fn acquire(name: &str) -> Result<Lock> {
    let path = Lock::path(name);
    let open = std::fs::OpenOptions::new().write(true).create_new(true).open(&path);
    match open {
      Ok(_) => Ok(Lock { path }),
      Err(x) if x.kind() == std::io::ErrorKind::AlreadyExists => {
        log::warn!("lock file {} is already held", path.display());
        Err(Error::LockHeld(path))
      }
      Err(x) => Err(x.into()),
    }
  }
}

impl Drop for Lock {
  fn drop(&mut self) {
    if let Err(x) = std::fs::remove_file(&self.path) {
      log::warn!("failed to remove lock file {}: {}", self.path.display(), x);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acquire_is_exclusive_until_dropped() {
    let name = "greinir-lock-test-exclusive";
    let first = Lock::acquire(name).unwrap();
    match Lock::acquire(name) {
      Err(Error::LockHeld(x)) => assert_eq!(x, Lock::path(name)),
      x => panic!("expected LockHeld, got {:?}", x.map(|_| ())),
    }
    std::mem::drop(first);
    let second = Lock::acquire(name).unwrap();
    std::mem::drop(second);
  }

  #[test]
  fn stale_lock_is_recovered_by_deletion() {
    let name = "greinir-lock-test-stale";
    let path = Lock::path(name);
    std::fs::write(&path, b"").unwrap();
    assert!(Lock::acquire(name).is_err());
    std::fs::remove_file(&path).unwrap();
    let lock = Lock::acquire(name).unwrap();
    std::mem::drop(lock);
  }
}
