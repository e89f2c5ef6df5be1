// dailytasks - Newest-first daily task notes persisted to a key-value slot

pub mod calendar;
pub mod config;
pub mod error;
pub mod file;
pub mod record;
pub mod sqlite;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use calendar::{DayGroup, DayLabel};
pub use config::{Backend, Config};
pub use error::{LookupError, StorageError, StoreError};
pub use file::FileStorage;
pub use record::TaskRecord;
pub use sqlite::SqliteStorage;
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{DEFAULT_SLOT_KEY, TaskStore};

// Re-export uuid so callers can name task ids
pub use uuid;
