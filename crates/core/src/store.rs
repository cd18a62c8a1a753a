use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(String),
    #[error("storage encode error: {0}")]
    Encode(String),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value.to_string())
    }
}

/// Durable string slots keyed by name. Values are JSON documents.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Reads and decodes a slot. Missing, unreadable and unparsable values all
/// come back as `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read stored value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "ignoring unparsable stored value");
            None
        }
    }
}

/// Encodes and writes a slot. Failures are logged and reported as `false`.
pub fn save_json<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|body| store.set(key, body));
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(key, error = %err, "failed to persist value");
            false
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(mut self, key: &str, raw: &str) -> Self {
        self.entries.insert(key.to_string(), raw.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io("disk unplugged".to_string()))
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Io("disk unplugged".to_string()))
        }
    }

    #[test]
    fn corrupt_value_reads_as_absent() {
        let store = MemoryStore::new().with_raw("k", "{not json");
        assert_eq!(load_json::<Vec<String>>(&store, "k"), None);
    }

    #[test]
    fn wrong_shape_reads_as_absent() {
        let store = MemoryStore::new().with_raw("k", r#"{"a":1}"#);
        assert_eq!(load_json::<Vec<String>>(&store, "k"), None);
    }

    #[test]
    fn failing_store_is_not_fatal() {
        let mut store = BrokenStore;
        assert!(!save_json(&mut store, "k", "value"));
        assert_eq!(load_json::<String>(&store, "k"), None);
    }

    #[test]
    fn saved_value_reads_back() {
        let mut store = MemoryStore::new();
        assert!(save_json(&mut store, "term", "ab"));
        assert_eq!(store.raw("term"), Some("\"ab\""));
        assert_eq!(load_json::<String>(&store, "term").as_deref(), Some("ab"));
    }
}
