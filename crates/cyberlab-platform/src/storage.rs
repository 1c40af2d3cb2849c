//! Client-local key-value storage for completion flags.
//!
//! One boolean per key. Values only ever flip `false -> true` in practice,
//! but the store itself does not enforce that.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use cyberlab_types::error::Result;

/// Boolean key-value store injected into the challenge host.
pub trait KeyValueStore {
    /// Read a flag. Missing keys read as `false`.
    fn get(&self, key: &str) -> bool;

    /// Write a flag.
    fn set(&mut self, key: &str, value: bool) -> Result<()>;
}

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: bool) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as a flat JSON object (`{"ctf_done_1": true}`).
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, bool>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        log::debug!("Opened completion store {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: bool) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_defaults_false() {
        let mut store = MemoryStore::new();
        assert!(!store.get("ctf_done_1"));
        store.set("ctf_done_1", true).unwrap();
        assert!(store.get("ctf_done_1"));
        assert!(!store.get("ctf_done_2"));
    }

    #[test]
    fn json_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("completed.json");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            assert!(!store.get("ctf_done_3"));
            store.set("ctf_done_3", true).unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("ctf_done_3"));
    }

    #[test]
    fn json_store_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.json");
        std::fs::write(&path, "").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert!(!store.get("anything"));
    }

    #[test]
    fn json_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
