// File-backed storage: one JSON file per slot

use crate::error::StorageError;
use crate::storage::{KeyValueStorage, validate_key};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CURRENT_VERSION: u32 = 1;
const LOCK_FILE: &str = ".lock";

/// Directory of `<key>.json` slot files
///
/// Writes go to a temp file that is fsynced and renamed over the slot while an
/// exclusive lock on `.lock` is held, so readers never see a partial slot.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create a storage directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).map_err(|source| StorageError::Io {
            path: base_path.clone(),
            source,
        })?;

        let storage = Self { base_path };
        storage.write_version()?;

        debug!(path = ?storage.base_path, "Opened file storage");
        Ok(storage)
    }

    /// Get the base path of this storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file backing `key`
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn write_version(&self) -> Result<(), StorageError> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(&version_path, CURRENT_VERSION.to_string()).map_err(|source| StorageError::Io {
                path: version_path,
                source,
            })?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<File, StorageError> {
        let lock_path = self.base_path.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StorageError::Io {
                path: lock_path.clone(),
                source,
            })?;

        file.lock_exclusive()
            .map_err(|source| StorageError::Lock { path: lock_path, source })?;

        // Lock is released when the handle is dropped
        Ok(file)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        let path = self.slot_path(key);

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.slot_path(key);
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        let _lock = self.lock()?;

        let written = File::create(&tmp_path)
            .and_then(|mut tmp| {
                tmp.write_all(value)?;
                tmp.sync_all()
            })
            .map_err(io_err(&tmp_path))
            .and_then(|()| fs::rename(&tmp_path, &path).map_err(io_err(&path)));

        if let Err(e) = written {
            // A half-written temp file must not outlive the failed write
            if let Err(cleanup) = fs::remove_file(&tmp_path)
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!(path = ?tmp_path, error = %cleanup, "Failed to remove temp slot file");
            }
            return Err(e);
        }

        debug!(key, bytes = value.len(), "Wrote slot file");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.slot_path(key);
        let _lock = self.lock()?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
