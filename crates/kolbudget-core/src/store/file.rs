//! Directory-backed [`KeyValueStore`].
//!
//! Layout under the data directory:
//!
//! ```text
//! <dir>/.lock          advisory lock file
//! <dir>/<key>.json     current value
//! <dir>/<key>.json.tmp in-flight write, renamed over <key>.json
//! ```

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::port::{KeyValueStore, StorageError, validate_key};

const LOCK_FILE: &str = ".lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    /// Store values under `dir`. Nothing is created until the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let _guard = FileGuard::acquire(&self.lock_path(), self.lock_timeout, LockKind::Shared)
            .map_err(|err| err.into_storage(key, false))?;

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let write_err = |source: io::Error| StorageError::Write {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let _guard = FileGuard::acquire(&self.lock_path(), self.lock_timeout, LockKind::Exclusive)
            .map_err(|err| err.into_storage(key, true))?;

        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        if let Err(source) = replace_via(&tmp, &target, value) {
            match fs::remove_file(&tmp) {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove partial write");
                }
                _ => {}
            }
            return Err(write_err(source));
        }

        tracing::debug!(path = %target.display(), bytes = value.len(), "value written");
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

#[derive(Debug)]
enum LockFailure {
    Timeout { path: PathBuf, waited: Duration },
    Io(io::Error),
}

impl LockFailure {
    fn into_storage(self, key: &str, writing: bool) -> StorageError {
        match self {
            Self::Timeout { path, waited } => StorageError::LockTimeout { path, waited },
            Self::Io(source) if writing => StorageError::Write {
                key: key.to_string(),
                source,
            },
            Self::Io(source) => StorageError::Read {
                key: key.to_string(),
                source,
            },
        }
    }
}

/// Holds an advisory lock until dropped.
#[derive(Debug)]
struct FileGuard {
    file: File,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockFailure> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(LockFailure::Io)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(LockFailure::Io)?;

            let acquired = match kind {
                LockKind::Shared => FileExt::try_lock_shared(&file).is_ok(),
                LockKind::Exclusive => FileExt::try_lock_exclusive(&file).is_ok(),
            };
            if acquired {
                return Ok(Self { file });
            }

            if start.elapsed() >= timeout {
                return Err(LockFailure::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn replace_via(tmp: &Path, target: &Path, value: &str) -> io::Result<()> {
    {
        let mut file = File::create(tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(tmp, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let tmp = TempDir::new().expect("tempdir");
        let store = FileStore::new(tmp.path().join("data"));
        (tmp, store)
    }

    #[test]
    fn missing_key_reads_none_without_creating_dir() {
        let (_tmp, store) = setup();
        assert_eq!(store.read("kol-budget-calcs").expect("read"), None);
        assert!(!store.dir().exists());
    }

    #[test]
    fn write_then_read() {
        let (_tmp, mut store) = setup();
        store.write("kol-budget-calcs", "[]").expect("write");
        assert_eq!(
            store.read("kol-budget-calcs").expect("read").as_deref(),
            Some("[]")
        );
        assert!(store.path_for("kol-budget-calcs").exists());
        assert!(!store.dir().join("kol-budget-calcs.json.tmp").exists());
    }

    #[test]
    fn overwrite_replaces_value() {
        let (_tmp, mut store) = setup();
        store.write("k", "first").expect("write");
        store.write("k", "second").expect("write");
        assert_eq!(store.read("k").expect("read").as_deref(), Some("second"));
    }

    #[test]
    fn failed_rename_removes_tmp_file() {
        let (_tmp, mut store) = setup();
        // A directory at the target path makes the final rename fail.
        fs::create_dir_all(store.path_for("k")).expect("block target");
        let err = store.write("k", "value").expect_err("rename must fail");
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(!store.dir().join("k.json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let (_tmp, mut store) = setup();
        assert!(matches!(
            store.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.read("a/b"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn exclusive_lock_times_out_while_held() {
        let (_tmp, mut store) = setup();
        store.write("k", "v").expect("write");
        let holder = FileGuard::acquire(
            &store.lock_path(),
            Duration::from_millis(50),
            LockKind::Exclusive,
        )
        .expect("first lock");

        let mut contender = store.clone().with_lock_timeout(Duration::from_millis(30));
        let err = contender.write("k", "w").expect_err("lock is held");
        assert!(matches!(err, StorageError::LockTimeout { .. }));

        drop(holder);
        contender.write("k", "w").expect("lock released");
        assert_eq!(store.read("k").expect("read").as_deref(), Some("w"));
    }
}
