// Ordered task store persisted to a key-value slot

use crate::calendar::{self, DayGroup};
use crate::error::{LookupError, StoreError};
use crate::record::TaskRecord;
use crate::storage::KeyValueStorage;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Slot the task list is stored under unless configured otherwise
pub const DEFAULT_SLOT_KEY: &str = "daily_tasks";

/// Newest-first list of task records, mirrored to one storage slot
///
/// Every mutation rewrites the full list to the slot before returning. If that
/// write fails the in-memory change is kept and the error is returned, so the
/// caller can decide whether to surface it. Loading degrades to an empty list.
///
/// Mutations take `&mut self`; a store has exactly one owner.
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    tasks: Vec<TaskRecord>,
    loaded: bool,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Create an empty, not-yet-loaded store on the default slot
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_SLOT_KEY)
    }

    /// Create an empty, not-yet-loaded store on a named slot
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            tasks: Vec::new(),
            loaded: false,
        }
    }

    /// Create a store and load it, absorbing load failures
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEFAULT_SLOT_KEY)
    }

    /// Like [`TaskStore::open`] on a named slot
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let mut store = Self::with_key(storage, key);
        // load() already logged and left the list empty
        let _ = store.load();
        store
    }

    /// Slot key this store persists to
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the storage, e.g. to reopen it as a fresh store
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // ========================================================================
    // Loading and saving
    // ========================================================================

    /// Replace the in-memory list with the persisted one.
    ///
    /// A missing slot yields an empty list and `Ok(0)`. A read or decode
    /// failure also leaves the list empty, and returns the error. The slot is
    /// left untouched either way.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        self.tasks.clear();
        self.loaded = true;

        let bytes = match self.storage.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %self.key, "No persisted tasks");
                return Ok(0);
            }
            Err(source) => {
                warn!(key = %self.key, error = %source, "Failed to read tasks, starting empty");
                return Err(StoreError::Read {
                    key: self.key.clone(),
                    source,
                });
            }
        };

        match serde_json::from_slice::<Vec<TaskRecord>>(&bytes) {
            Ok(tasks) => {
                self.tasks = tasks;
                info!(key = %self.key, count = self.tasks.len(), "Loaded tasks");
                Ok(self.tasks.len())
            }
            Err(source) => {
                warn!(key = %self.key, error = %source, "Failed to decode tasks, starting empty");
                Err(StoreError::Decode {
                    key: self.key.clone(),
                    source,
                })
            }
        }
    }

    /// Write the full list to the slot
    pub fn save(&mut self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.tasks).map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to encode tasks");
            StoreError::Serialize(e)
        })?;

        self.storage.set(&self.key, &bytes).map_err(|source| {
            warn!(key = %self.key, error = %source, "Failed to write tasks");
            StoreError::Write {
                key: self.key.clone(),
                source,
            }
        })?;

        debug!(key = %self.key, count = self.tasks.len(), bytes = bytes.len(), "Saved tasks");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task stamped with the current time
    pub fn create(&mut self, text: impl Into<String>) -> Result<TaskRecord, StoreError> {
        self.create_at(text, Utc::now())
    }

    /// Add a task with an explicit creation time.
    ///
    /// The record goes to the front of the list regardless of `timestamp`.
    pub fn create_at(&mut self, text: impl Into<String>, timestamp: DateTime<Utc>) -> Result<TaskRecord, StoreError> {
        let record = TaskRecord::new(text, timestamp);
        self.tasks.insert(0, record.clone());
        debug!(id = %record.id, "Created task");

        self.save()?;
        Ok(record)
    }

    /// Remove the task with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &Uuid) -> Result<bool, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        let removed = self.tasks.len() != before;
        debug!(%id, removed, "Deleted task");

        self.save()?;
        Ok(removed)
    }

    /// Remove every task. Returns how many were removed.
    pub fn delete_all(&mut self) -> Result<usize, StoreError> {
        let count = self.tasks.len();
        self.tasks.clear();
        debug!(count, "Cleared all tasks");

        self.save()?;
        Ok(count)
    }

    /// Remove every task whose id is in `ids`, saving once
    pub fn delete_group(&mut self, ids: &HashSet<Uuid>) -> Result<usize, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !ids.contains(&t.id));
        let count = before - self.tasks.len();
        debug!(count, requested = ids.len(), "Deleted task group");

        self.save()?;
        Ok(count)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All tasks, newest first
    pub fn list_all(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn get(&self, id: &Uuid) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Tasks whose id starts with `prefix` (hex, dashes ignored, case-insensitive)
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&TaskRecord> {
        let needle: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if needle.is_empty() {
            return Vec::new();
        }

        self.tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle))
            .collect()
    }

    /// Resolve a full id or a unique id prefix to one task
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&TaskRecord, LookupError> {
        let not_found = || LookupError::NotFound(id_or_prefix.to_string());

        if let Ok(id) = Uuid::parse_str(id_or_prefix) {
            return self.get(&id).ok_or_else(not_found);
        }

        match self.find_by_prefix(id_or_prefix).as_slice() {
            [] => Err(not_found()),
            [task] => Ok(*task),
            matches => Err(LookupError::Ambiguous {
                prefix: id_or_prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Tasks created on the current local day
    pub fn list_today(&self) -> Vec<TaskRecord> {
        self.list_on(&Local::now())
    }

    /// Tasks created on `now`'s local day, in list order
    pub fn list_on<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<TaskRecord> {
        calendar::filter_today(&self.tasks, now)
    }

    /// Tasks grouped by local day relative to the current time
    pub fn group_by_day(&self) -> Vec<DayGroup> {
        self.group_by_day_at(&Local::now())
    }

    pub fn group_by_day_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayGroup> {
        calendar::group_by_day(&self.tasks, now)
    }
}
