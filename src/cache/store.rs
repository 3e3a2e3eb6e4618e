// Artifact store backends.
//
// The cache is addressed as a flat key-value space where keys are relative
// paths ("<identity_dir>/<artifact_name>"). FsStore is the production
// backend; MemoryStore exists so tests never touch disk. No backend takes a
// lock: the pipeline runs on a single logical thread, and two processes
// sharing a cache directory racing on the persist step is a documented,
// unguarded limitation.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Injectable key-value store for persisted artifacts.
pub trait ArtifactStore {
    /// Raw bytes for a key, or `None` when nothing is persisted.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Persist bytes under a key, replacing any previous value.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Whether anything is persisted under the key.
    fn contains(&self, key: &str) -> bool;

    /// Last-modified time of a persisted artifact, when the backend tracks one.
    fn modified(&self, key: &str) -> Option<SystemTime> {
        let _ = key;
        None
    }
}

/// Filesystem-backed store rooted at one cache directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ArtifactStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        // Write-then-rename so a crash mid-write never leaves a torn artifact.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(key, bytes = bytes.len(), "Persisted artifact");
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    fn modified(&self, key: &str) -> Option<SystemTime> {
        fs::metadata(self.path_for(key))
            .and_then(|m| m.modified())
            .ok()
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().expect("store poisoned").get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.map
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.map.lock().expect("store poisoned").contains_key(key)
    }
}
