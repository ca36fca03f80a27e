//! Client-local key/value storage.
//!
//! Values are JSON-encoded text, one entry per key, like browser local storage.
//! `FileStorage` keeps every key in a single JSON object file; `MemoryStorage`
//! is used by tests and as the fallback once the file becomes unusable.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::StorageError;

const STORAGE_FILE: &str = "storage.json";

pub trait Storage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Persists all keys to `<dir>/storage.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `read_all`, but an unparseable file is moved aside to
    /// `storage.json.bak` and treated as empty so the next write repairs it.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_all() {
            Err(StorageError::Serialization(e)) => {
                let backup = self.path.with_extension("json.bak");
                warn!(
                    "Local storage {} is corrupt ({e}), moving it to {}",
                    self.path.display(),
                    backup.display()
                );
                fs::rename(&self.path, &backup)?;
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    /// Writes to a sibling temp file, then renames over the original.
    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    /// An unparseable file reads as empty; the next write moves it aside.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.read_all() {
            Ok(mut items) => Ok(items.remove(key)),
            Err(StorageError::Serialization(e)) => {
                warn!("Local storage {} is unreadable: {e}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_for_write()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_for_write()?;
        if items.remove(key).is_some() || !self.path.exists() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}
