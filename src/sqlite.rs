// SQLite-backed settings table

use crate::error::StorageError;
use crate::storage::{KeyValueStorage, validate_key};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Key-value slots in a single SQLite database file
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let db = Connection::open(path)?;
        let storage = Self { db };
        storage.create_schema()?;

        debug!(?path, "Opened sqlite storage");
        Ok(storage)
    }

    /// Database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = Self {
            db: Connection::open_in_memory()?,
        };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;

        let value = self
            .db
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;

        Ok(value)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;

        self.db.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )?;

        debug!(key, bytes = value.len(), "Wrote settings row");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.db.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("data").join("settings.db");

        let _storage = SqliteStorage::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_get_set_remove() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.get("daily_tasks").unwrap().is_none());

        storage.set("daily_tasks", b"[]").unwrap();
        assert_eq!(storage.get("daily_tasks").unwrap(), Some(b"[]".to_vec()));

        storage.set("daily_tasks", b"[1]").unwrap();
        assert_eq!(storage.get("daily_tasks").unwrap(), Some(b"[1]".to_vec()));

        let rows: i64 = storage
            .db()
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        storage.remove("daily_tasks").unwrap();
        assert!(storage.get("daily_tasks").unwrap().is_none());
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("settings.db");
        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage.set("slot", b"persisted").unwrap();
        }

        let storage = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(storage.get("slot").unwrap(), Some(b"persisted".to_vec()));
    }

    #[test]
    fn test_rejects_invalid_key() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert!(matches!(
            storage.set("", b"x"),
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
