// Key-value storage capability the task store persists through

use crate::error::StorageError;
use std::collections::HashMap;

/// Named byte slots
///
/// Implementations: [`MemoryStorage`], [`crate::FileStorage`], [`crate::SqliteStorage`].
pub trait KeyValueStorage {
    /// Read a slot, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the slot's contents
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove a slot (no-op if absent)
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Validate a slot key.
///
/// Keys double as file names for [`crate::FileStorage`], so they are kept to
/// alphanumerics, `_` and `-`.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(invalid("key too long (max 64 chars)"));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(invalid("must be alphanumeric with _/-"));
    }
    Ok(())
}

/// In-process storage, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        // Valid
        assert!(validate_key("daily_tasks").is_ok());
        assert!(validate_key("daily-tasks-2").is_ok());

        // Invalid
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_memory_storage_get_set_remove() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get("slot").unwrap().is_none());

        storage.set("slot", b"[1,2]").unwrap();
        assert_eq!(storage.get("slot").unwrap().as_deref(), Some(&b"[1,2]"[..]));
        assert_eq!(storage.len(), 1);

        storage.set("slot", b"[]").unwrap();
        assert_eq!(storage.get("slot").unwrap().as_deref(), Some(&b"[]"[..]));

        storage.remove("slot").unwrap();
        assert!(storage.get("slot").unwrap().is_none());
        assert!(storage.is_empty());

        // Removing twice is fine
        storage.remove("slot").unwrap();
    }

    #[test]
    fn test_memory_storage_rejects_bad_key() {
        let mut storage = MemoryStorage::new();
        let err = storage.set("a/b", b"x").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[test]
    fn test_boxed_storage_delegates() {
        let mut storage: Box<dyn KeyValueStorage> = Box::new(MemoryStorage::new());
        storage.set("slot", b"x").unwrap();
        assert_eq!(storage.get("slot").unwrap(), Some(b"x".to_vec()));
    }
}
