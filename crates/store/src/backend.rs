//! Key-value backends for the proof store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::{Result, StoreError};

/// Minimal persistent key-value capability.
pub trait KvStore: Send + Sync {
    /// Read a value; `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// In-memory backend for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Writes go to `<key>.json.tmp` and are renamed over `<key>.json`, so a
/// crash mid-write never leaves a truncated value behind.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open (and create if needed) a store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StoreError::Backend(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Backend(format!("{}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)
            .map_err(|e| StoreError::Backend(format!("{}: {}", tmp_path.display(), e)))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            StoreError::Backend(format!("{} -> {}: {}", tmp_path.display(), path.display(), e))
        })?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("claimcraft-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_get_missing() {
        let kv = MemoryKvStore::new();
        assert_eq!(kv.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_memory_set_overwrites() {
        let kv = MemoryKvStore::new();
        kv.set("k", b"one").unwrap();
        kv.set("k", b"two").unwrap();
        assert_eq!(kv.get("k").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_dir("kv-roundtrip");
        let kv = FileKvStore::open(&dir).unwrap();

        assert_eq!(kv.get("claimcraft.distributions").unwrap(), None);
        kv.set("claimcraft.distributions", b"{}").unwrap();
        assert_eq!(kv.get("claimcraft.distributions").unwrap(), Some(b"{}".to_vec()));

        // No tmp file left behind
        assert!(!dir.join("claimcraft.distributions.json.tmp").exists());

        // Reopen sees the same data
        let reopened = FileKvStore::open(&dir).unwrap();
        assert_eq!(reopened.get("claimcraft.distributions").unwrap(), Some(b"{}".to_vec()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = temp_dir("kv-keys");
        let kv = FileKvStore::open(&dir).unwrap();
        assert!(kv.set("../escape", b"x").is_err());
        assert!(kv.get("").is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
