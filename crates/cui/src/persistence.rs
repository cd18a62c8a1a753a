use heropick_core::{KeyValueStore, StoreError};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub fn default_state_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("HEROPICK_STATE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".heropick_state.json"))
}

/// Key/value slots kept as one JSON object on disk. Every `set` writes the
/// whole file to a sibling temp file and renames it over the old one.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    slots: Map<String, Value>,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens `path`. A missing file starts empty; an unreadable or corrupt
    /// file is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slots = match fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str::<Map<String, Value>>(&body) {
                Ok(slots) => slots,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "state file is corrupt, starting fresh");
                    Map::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "state file unreadable, starting fresh");
                Map::new()
            }
        };
        Self {
            path,
            slots,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let body = serde_json::to_string_pretty(&self.slots)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        self.dirty = false;
        debug!(path = %self.path.display(), slots = self.slots.len(), "state written");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.slots.get(key) {
            Some(value) => Ok(Some(serde_json::to_string(value)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
        self.slots.insert(key.to_string(), value);
        self.dirty = true;
        self.write()
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.write()?;
        }
        Ok(())
    }
}
