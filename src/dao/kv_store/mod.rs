/// JSON file backend.
pub mod file;
/// Volatile backend.
pub mod memory;

use crate::dao::storage::StorageResult;

pub use self::{file::FileStore, memory::MemoryStore};

/// Durable, synchronous, string-keyed storage used by the persistence adapter.
///
/// Backends must make a successful `set`/`remove` visible to every later `get`
/// on the same instance, and durable across restarts when they claim to be.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Delete `key`; missing keys are not an error.
    fn remove(&mut self, key: &str) -> StorageResult<()>;
    /// Every stored key.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}
