use std::path::PathBuf;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by key-value backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage file `{path}` is not accessible")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing document is not a flat string-to-string JSON object.
    #[error("storage file `{path}` is corrupted")]
    Corrupted {
        /// Offending file.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// A record could not be serialized before being written.
    #[error("failed to encode record `{key}`")]
    Encode {
        /// Key the record was meant for.
        key: String,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },
}
