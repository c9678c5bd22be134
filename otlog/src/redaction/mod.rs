mod __test__;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Which field keys get their values replaced by a sentinel.
///
/// The key set is a compile-time slice (captured from `Config`) unioned with
/// a runtime set behind a read-write lock. The log path only ever takes the
/// read lock, and skips it entirely while the runtime set is empty.
#[derive(Debug)]
pub struct RedactionPolicy {
  static_keys: &'static [&'static str],
  runtime_keys: RwLock<HashSet<String>>,
  runtime_len: AtomicUsize,
}

impl RedactionPolicy {
  pub fn new(static_keys: &'static [&'static str]) -> Self {
    Self {
      static_keys,
      runtime_keys: RwLock::new(HashSet::new()),
      runtime_len: AtomicUsize::new(0),
    }
  }

  /// True when `key` is in either set. A poisoned lock redacts
  /// conservatively.
  pub fn is_redacted(&self, key: &str) -> bool {
    if self.static_keys.iter().any(|&k| k == key) {
      return true;
    }
    if self.runtime_len.load(Ordering::Relaxed) == 0 {
      return false;
    }
    match self.runtime_keys.read() {
      Ok(keys) => keys.contains(key),
      Err(_) => true,
    }
  }

  pub fn add_key(&self, key: impl Into<String>) {
    if let Ok(mut keys) = self.runtime_keys.write() {
      keys.insert(key.into());
      self.runtime_len.store(keys.len(), Ordering::Relaxed);
    }
  }

  pub fn remove_key(&self, key: &str) {
    if let Ok(mut keys) = self.runtime_keys.write() {
      keys.remove(key);
      self.runtime_len.store(keys.len(), Ordering::Relaxed);
    }
  }

  pub fn clear_runtime(&self) {
    if let Ok(mut keys) = self.runtime_keys.write() {
      keys.clear();
      self.runtime_len.store(0, Ordering::Relaxed);
    }
  }

  #[inline]
  pub fn static_keys(&self) -> &'static [&'static str] {
    self.static_keys
  }

  pub fn runtime_len(&self) -> usize {
    self.runtime_len.load(Ordering::Relaxed)
  }
}
