//! Persistence adapter for puzzle locks, final states, progress snapshots and trophies.
//!
//! Every record lives in a [`KeyValueStore`] under a versioned namespace. Reads
//! are soft: a missing, unreadable or malformed value is logged and reported as
//! absent so callers fall back to a fresh session instead of failing.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dao::{
    kv_store::KeyValueStore,
    models::{FinalStateEntity, ProgressEntity},
    storage::{StorageError, StorageResult},
};

/// Namespace used by the first browser release.
pub const LEGACY_NAMESPACE: &str = "4hiburim-";
/// Namespace of the current key schema.
pub const CURRENT_NAMESPACE: &str = "hiburim:v2:";
/// Value stored under a lock key.
pub const LOCK_SENTINEL: &str = "done";

const LOCK_SEGMENT: &str = "puzzle-";
const FINAL_SEGMENT: &str = "state-";
const PROGRESS_SEGMENT: &str = "progress-";
const TROPHY_SEGMENT: &str = "trophies";

/// Identifies one puzzle on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleKey {
    /// Day formatted `DD.MM.YYYY`.
    pub date: String,
    /// Catalog identifier of the puzzle.
    pub puzzle_id: String,
}

impl PuzzleKey {
    /// Build a key from its parts.
    pub fn new(date: impl Into<String>, puzzle_id: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            puzzle_id: puzzle_id.into(),
        }
    }
}

/// Layout of every persisted key under a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    namespace: String,
}

impl KeySchema {
    /// Schema rooted at `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Current versioned schema.
    pub fn current() -> Self {
        Self::new(CURRENT_NAMESPACE)
    }

    /// Key of the lock marker.
    pub fn lock_key(&self, key: &PuzzleKey) -> String {
        self.scoped(LOCK_SEGMENT, key)
    }

    /// Key of the final-state record.
    pub fn final_key(&self, key: &PuzzleKey) -> String {
        self.scoped(FINAL_SEGMENT, key)
    }

    /// Key of the in-progress snapshot.
    pub fn progress_key(&self, key: &PuzzleKey) -> String {
        self.scoped(PROGRESS_SEGMENT, key)
    }

    /// Key of the lifetime trophy counter.
    pub fn trophy_key(&self) -> String {
        format!("{}{}", self.namespace, TROPHY_SEGMENT)
    }

    fn scoped(&self, segment: &str, key: &PuzzleKey) -> String {
        format!(
            "{}{}{}-{}",
            self.namespace, segment, key.date, key.puzzle_id
        )
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::current()
    }
}

/// A stored record exists but cannot be decoded.
#[derive(Debug, Error)]
#[error("stored record `{key}` is malformed")]
pub struct DecodeError {
    key: String,
    #[source]
    source: serde_json::Error,
}

/// Typed persistence operations on top of a raw key-value store.
#[derive(Debug)]
pub struct PuzzleStore<S> {
    store: S,
    schema: KeySchema,
}

impl<S: KeyValueStore> PuzzleStore<S> {
    /// Wrap `store` using the current key schema.
    pub fn new(store: S) -> Self {
        Self::with_schema(store, KeySchema::current())
    }

    /// Wrap `store` using a custom key schema.
    pub fn with_schema(store: S, schema: KeySchema) -> Self {
        Self { store, schema }
    }

    /// Borrow the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Give back the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Key schema in use.
    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    /// Whether the puzzle is closed to further play.
    pub fn is_locked(&self, key: &PuzzleKey) -> bool {
        self.read(&self.schema.lock_key(key)).as_deref() == Some(LOCK_SENTINEL)
    }

    /// Close the puzzle for good. There is no inverse operation.
    pub fn lock(&mut self, key: &PuzzleKey) -> StorageResult<()> {
        let lock_key = self.schema.lock_key(key);
        self.store.set(&lock_key, LOCK_SENTINEL)?;
        info!(key = %lock_key, "puzzle locked");
        Ok(())
    }

    /// Persist the terminal outcome of a puzzle.
    pub fn save_final(&mut self, key: &PuzzleKey, state: &FinalStateEntity) -> StorageResult<()> {
        let final_key = self.schema.final_key(key);
        self.write(&final_key, state)
    }

    /// Load the terminal outcome of a puzzle; malformed values read as absent.
    pub fn load_final(&self, key: &PuzzleKey) -> Option<FinalStateEntity> {
        self.read_record(&self.schema.final_key(key))
    }

    /// Persist an in-progress snapshot.
    pub fn save_progress(&mut self, key: &PuzzleKey, progress: &ProgressEntity) -> StorageResult<()> {
        let progress_key = self.schema.progress_key(key);
        self.write(&progress_key, progress)
    }

    /// Load an in-progress snapshot; malformed values read as absent.
    pub fn load_progress(&self, key: &PuzzleKey) -> Option<ProgressEntity> {
        self.read_record(&self.schema.progress_key(key))
    }

    /// Drop the in-progress snapshot, if any.
    pub fn clear_progress(&mut self, key: &PuzzleKey) -> StorageResult<()> {
        self.store.remove(&self.schema.progress_key(key))
    }

    /// Lifetime number of solved puzzles; missing or malformed values count as zero.
    pub fn trophy_count(&self) -> u32 {
        let trophy_key = self.schema.trophy_key();
        let Some(raw) = self.read(&trophy_key) else {
            return 0;
        };
        raw.trim().parse().unwrap_or_else(|err| {
            warn!(key = %trophy_key, value = %raw, error = %err, "malformed trophy count; using 0");
            0
        })
    }

    /// Add one trophy and return the new total.
    pub fn increment_trophy_count(&mut self) -> StorageResult<u32> {
        let next = self.trophy_count().saturating_add(1);
        self.store.set(&self.schema.trophy_key(), &next.to_string())?;
        info!(trophies = next, "trophy awarded");
        Ok(next)
    }

    /// Copy every `old_prefix*` key to `new_prefix*` unless the destination already exists.
    ///
    /// Running the migration again never overwrites a previously migrated value.
    /// Returns the number of keys copied.
    pub fn migrate_legacy_keys(&mut self, old_prefix: &str, new_prefix: &str) -> StorageResult<usize> {
        if old_prefix == new_prefix {
            return Ok(0);
        }

        let mut copied = 0;
        for old_key in self.store.keys()? {
            let Some(rest) = old_key.strip_prefix(old_prefix) else {
                continue;
            };
            let new_key = format!("{new_prefix}{rest}");
            if self.store.get(&new_key)?.is_some() {
                debug!(from = %old_key, to = %new_key, "destination already present; skipping");
                continue;
            }
            let Some(value) = self.store.get(&old_key)? else {
                continue;
            };
            self.store.set(&new_key, &value)?;
            copied += 1;
        }

        if copied > 0 {
            info!(copied, from = old_prefix, to = new_prefix, "migrated legacy keys");
        }
        Ok(copied)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "storage read failed; treating value as absent");
                None
            }
        }
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match decode(key, &raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "discarding malformed record");
                None
            }
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, record: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(record).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw)
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, DecodeError> {
    serde_json::from_str(raw).map_err(|source| DecodeError {
        key: key.to_string(),
        source,
    })
}
