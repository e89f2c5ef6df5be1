// Error types for storage backends and the task store

use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a key-value storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid slot key `{key}`: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error")]
    Sqlite(#[from] rusqlite::Error),
}

/// Failure while persisting or loading the task list
///
/// The store never rolls back in-memory state when one of these is returned;
/// see [`crate::TaskStore`] for the exact policy per operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode task list")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write slot `{key}`")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to read slot `{key}`")]
    Read {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to decode slot `{key}`")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure resolving a user-supplied task id or id prefix
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no task matches {0}")]
    NotFound(String),

    #[error("{count} tasks match {prefix}, use a longer prefix")]
    Ambiguous { prefix: String, count: usize },
}

impl StoreError {
    /// True for errors raised while saving (the in-memory change still applied)
    pub fn is_save_failure(&self) -> bool {
        matches!(self, StoreError::Serialize(_) | StoreError::Write { .. })
    }

    /// True for errors raised while loading (the in-memory list is empty)
    pub fn is_load_failure(&self) -> bool {
        matches!(self, StoreError::Read { .. } | StoreError::Decode { .. })
    }
}
