//! The key-value persistence port the calculation store writes through.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::error::ErrorCode;

/// Blob storage keyed by short string keys.
///
/// Implementations store whole values; there is no partial update.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if nothing was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value cannot be durably stored.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Failures reported by a [`KeyValueStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("lock on {} not acquired after {waited:?}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The backend refused the operation (e.g. quota exhausted).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StorageReadFailed,
            Self::Write { .. } | Self::Unavailable(_) => ErrorCode::StorageWriteFailed,
            Self::InvalidKey(_) => ErrorCode::InvalidStorageKey,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
        }
    }
}

/// Keys are limited to `[A-Za-z0-9._-]` so they map safely onto file names.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for empty keys, keys containing other
/// characters, and the reserved `.` / `..`.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if key.is_empty() || key == "." || key == ".." || !key.chars().all(allowed) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-process store. Clones share contents, so a test can hand one clone to a
/// session and inspect or sabotage the backing map through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing failure injection.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.into(), value.into());
    }

    /// Peek at a raw value, bypassing failure injection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.borrow();
        if inner.fail_reads {
            return Err(StorageError::Read {
                key: key.to_string(),
                source: io::Error::other("injected read failure"),
            });
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable("injected write failure".to_string()));
        }
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_shares_state() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        assert_eq!(handle.read("k").expect("read"), None);
        handle.write("k", "[]").expect("write");
        assert_eq!(store.get("k").as_deref(), Some("[]"));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn injected_failures() {
        let mut store = MemoryStore::new();
        store.insert("k", "v");
        store.set_fail_reads(true);
        let err = store.read("k").expect_err("read must fail");
        assert_eq!(err.code(), ErrorCode::StorageReadFailed);

        store.set_fail_writes(true);
        let err = store.write("k", "w").expect_err("write must fail");
        assert_eq!(err.code(), ErrorCode::StorageWriteFailed);
        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn key_validation() {
        assert!(validate_key("kol-budget-calcs").is_ok());
        assert!(validate_key("kol-budget-calcs.corrupt").is_ok());
        for bad in ["", ".", "..", "a/b", "a b", "../x", "ä"] {
            assert!(
                matches!(validate_key(bad), Err(StorageError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
