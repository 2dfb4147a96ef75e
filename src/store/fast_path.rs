//! Synchronous fast-path cache for the key-press hot path.
//!
//! Holds an msgpack-encoded copy of what the authoritative store last
//! returned, so a fresh context can answer its first keystroke without a
//! store round-trip. Never the source of truth: the engine compares it
//! against the store at the next opportunity and overwrites it on mismatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::StoreError;

pub trait FastPath: Send + Sync {
    /// Cached bytes for `key`. Unreadable entries count as absent.
    fn read(&self, key: &str) -> Option<Vec<u8>>;

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryFastPath {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFastPath {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FastPath for MemoryFastPath {
    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One file per key under a cache directory.
#[derive(Debug, Clone)]
pub struct FileFastPath {
    dir: PathBuf,
}

impl FileFastPath {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.msgpack"))
    }
}

impl FastPath for FileFastPath {
    fn read(&self, key: &str) -> Option<Vec<u8>> {
        std::fs::read(self.entry_path(key)).ok()
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.entry_path(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_read_back() {
        let cache = MemoryFastPath::new();
        assert_eq!(cache.read("shortcuts"), None);
        cache.write("shortcuts", b"\x90").unwrap();
        assert_eq!(cache.read("shortcuts"), Some(vec![0x90]));
    }

    #[test]
    fn file_read_back_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFastPath::new(dir.path().join("cache"));
        assert_eq!(cache.read("shortcuts"), None);

        cache.write("shortcuts", b"abc").unwrap();
        assert_eq!(cache.read("shortcuts"), Some(b"abc".to_vec()));
        assert!(dir.path().join("cache").join("shortcuts.msgpack").exists());
    }
}
