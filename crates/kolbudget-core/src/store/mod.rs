//! Bounded persistence policy for saved calculations.
//!
//! [`CalculationStore`] owns no collection of its own. The session hands it
//! the collection to mutate; every mutation is followed by a full
//! encode-and-write through the [`KeyValueStore`] port. The in-memory
//! collection is authoritative: a failed write is reported, never rolled back.
//!
//! Ordering: newest entries are prepended and the bound is enforced by
//! truncating the tail, so eviction follows insertion order. That is not
//! necessarily `created_at` order; [`list_by_recency`] sorts by `created_at`
//! for display and the two can disagree if timestamps were imported or the
//! clock stepped backwards.

pub mod codec;
pub mod file;
pub mod port;

use crate::clock::{Clock, SystemClock};
use crate::error::ErrorCode;
use crate::model::{CalculationId, Level, SavedCalculation};

pub use file::FileStore;
pub use port::{KeyValueStore, MemoryStore, StorageError};

/// Key the blob is stored under.
pub const STORAGE_KEY: &str = "kol-budget-calcs";

/// Maximum number of saved calculations kept.
pub const MAX_SAVED_RESULTS: usize = 20;

/// Suffix of the key a corrupt blob is copied to before it is ignored.
pub const QUARANTINE_SUFFIX: &str = ".corrupt";

/// Save rejected before anything was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("calculation name must not be blank")]
    EmptyName,
}

impl SaveError {
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::EmptyName => ErrorCode::EmptyName,
        }
    }
}

/// Failure to write the collection after an in-memory change.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to encode saved calculations: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PersistError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Encode(_) => ErrorCode::InternalUnexpected,
            Self::Storage(err) => err.code(),
        }
    }
}

/// A mutation that has been applied in memory, plus the outcome of the
/// follow-up write.
#[derive(Debug)]
#[must_use]
pub struct Applied<T> {
    pub value: T,
    pub write_error: Option<PersistError>,
}

impl<T> Applied<T> {
    fn new(value: T, write: Result<(), PersistError>) -> Self {
        Self {
            value,
            write_error: write.err(),
        }
    }
}

/// What a successful save produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub id: CalculationId,
    /// Entries pushed past capacity, oldest-inserted last.
    pub evicted: Vec<SavedCalculation>,
}

/// Where the startup collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing stored yet (or an empty value).
    Absent,
    /// The stored blob decoded.
    Stored,
    /// The blob was not a JSON array. `quarantined` reports whether the raw
    /// text was copied aside before being ignored.
    Corrupt { quarantined: bool },
    /// The port failed to read.
    Unreadable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    /// Entries in an otherwise valid blob that failed to decode.
    pub discarded: usize,
    /// Entries dropped because the blob held more than capacity.
    pub truncated: usize,
}

impl LoadReport {
    const fn new(source: LoadSource) -> Self {
        Self {
            source,
            discarded: 0,
            truncated: 0,
        }
    }

    /// Error code describing a degraded load, if any.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self.source {
            LoadSource::Corrupt { .. } => Some(ErrorCode::StorageCorrupt),
            LoadSource::Unreadable => Some(ErrorCode::StorageReadFailed),
            LoadSource::Absent | LoadSource::Stored => None,
        }
    }
}

pub struct CalculationStore<S> {
    port: S,
    key: String,
    capacity: usize,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> CalculationStore<S> {
    /// Store under [`STORAGE_KEY`] with [`MAX_SAVED_RESULTS`] capacity and the
    /// system clock.
    pub fn new(port: S) -> Self {
        Self {
            port,
            key: STORAGE_KEY.to_string(),
            capacity: MAX_SAVED_RESULTS,
            clock: Box::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Capacity is clamped to at least one entry.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn port(&self) -> &S {
        &self.port
    }

    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Read the persisted collection. Never fails: anything unusable yields
    /// an empty collection and is described in the [`LoadReport`].
    pub fn open(&mut self) -> (Vec<SavedCalculation>, LoadReport) {
        let raw = match self.port.read(&self.key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                tracing::debug!(key = %self.key, "no saved calculations stored");
                return (Vec::new(), LoadReport::new(LoadSource::Absent));
            }
            Err(err) => {
                tracing::warn!(key = %self.key, code = %err.code(), error = %err, "failed to read saved calculations");
                return (Vec::new(), LoadReport::new(LoadSource::Unreadable));
            }
        };

        let decoded = match codec::decode(&raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                let quarantined = self.quarantine(&raw);
                tracing::warn!(
                    key = %self.key,
                    error = %err,
                    quarantined,
                    "stored calculations are corrupt; starting empty"
                );
                return (
                    Vec::new(),
                    LoadReport::new(LoadSource::Corrupt { quarantined }),
                );
            }
        };

        let mut entries = decoded.entries;
        let mut report = LoadReport::new(LoadSource::Stored);
        report.discarded = decoded.discarded;
        if entries.len() > self.capacity {
            report.truncated = entries.len() - self.capacity;
            entries.truncate(self.capacity);
        }

        if report.discarded > 0 || report.truncated > 0 {
            tracing::warn!(
                key = %self.key,
                kept = entries.len(),
                discarded = report.discarded,
                truncated = report.truncated,
                "saved calculations partially recovered"
            );
        } else {
            tracing::info!(key = %self.key, count = entries.len(), "saved calculations loaded");
        }
        (entries, report)
    }

    /// Copy `raw` to `<key>.corrupt`. An earlier, different copy there is kept
    /// and `raw` goes to `<key>.corrupt.<timestamp>` instead; a copy identical
    /// to `raw` is not written again.
    fn quarantine(&mut self, raw: &str) -> bool {
        let base = format!("{}{QUARANTINE_SUFFIX}", self.key);
        let key = match self.port.read(&base) {
            Ok(Some(existing)) if existing == raw => {
                tracing::debug!(key = %base, "corrupt blob already quarantined");
                return true;
            }
            Ok(Some(existing)) if !existing.trim().is_empty() => {
                self.stamped(&base)
            }
            Ok(_) => base,
            Err(err) => {
                tracing::debug!(key = %base, error = %err, "could not inspect quarantine slot");
                self.stamped(&base)
            }
        };
        match self.port.write(&key, raw) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to quarantine corrupt blob");
                false
            }
        }
    }

    fn stamped(&self, base: &str) -> String {
        format!("{base}.{}", self.clock.now().format("%Y%m%dT%H%M%S%3fZ"))
    }

    /// Snapshot `levels` under `name`, prepend it, evict past capacity, and
    /// write.
    ///
    /// # Errors
    ///
    /// [`SaveError::EmptyName`] if `name` is empty or whitespace; `saved` is
    /// left untouched.
    pub fn save(
        &mut self,
        saved: &mut Vec<SavedCalculation>,
        name: &str,
        levels: &[Level],
    ) -> Result<Applied<SaveReceipt>, SaveError> {
        if name.trim().is_empty() {
            return Err(SaveError::EmptyName);
        }

        let snapshot = SavedCalculation::new(name, levels, self.clock.now());
        let id = snapshot.id().clone();
        saved.insert(0, snapshot);

        let evicted = if saved.len() > self.capacity {
            saved.split_off(self.capacity)
        } else {
            Vec::new()
        };
        for gone in &evicted {
            tracing::info!(id = %gone.id(), name = gone.name(), "evicted oldest saved calculation");
        }
        tracing::info!(%id, name, levels = levels.len(), "calculation saved");

        let write = self.persist(saved);
        Ok(Applied::new(SaveReceipt { id, evicted }, write))
    }

    /// Remove the entry with `id`. A missing id changes nothing and writes
    /// nothing.
    pub fn delete(
        &mut self,
        saved: &mut Vec<SavedCalculation>,
        id: &CalculationId,
    ) -> Applied<Option<SavedCalculation>> {
        let Some(index) = saved.iter().position(|entry| entry.id() == id) else {
            tracing::debug!(%id, "delete of unknown calculation ignored");
            return Applied::new(None, Ok(()));
        };
        let removed = saved.remove(index);
        tracing::info!(%id, name = removed.name(), "calculation deleted");
        let write = self.persist(saved);
        Applied::new(Some(removed), write)
    }

    /// Encode and write the whole collection, at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if encoding or the port write fails.
    pub fn persist(&mut self, saved: &[SavedCalculation]) -> Result<(), PersistError> {
        let bounded = &saved[..saved.len().min(self.capacity)];
        let blob = codec::encode(bounded)?;
        self.port.write(&self.key, &blob).map_err(|err| {
            tracing::warn!(key = %self.key, code = %err.code(), error = %err, "failed to persist saved calculations");
            PersistError::from(err)
        })
    }
}

/// The levels of the entry with `id`, as stored. Callers that intend to
/// mutate must clone.
#[must_use]
pub fn load<'a>(saved: &'a [SavedCalculation], id: &CalculationId) -> Option<&'a [Level]> {
    find(saved, id).map(SavedCalculation::levels)
}

#[must_use]
pub fn find<'a>(saved: &'a [SavedCalculation], id: &CalculationId) -> Option<&'a SavedCalculation> {
    saved.iter().find(|entry| entry.id() == id)
}

/// Entries newest-first by `created_at`. Ties keep stored order.
#[must_use]
pub fn list_by_recency(saved: &[SavedCalculation]) -> Vec<&SavedCalculation> {
    let mut view: Vec<&SavedCalculation> = saved.iter().collect();
    view.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    view
}
