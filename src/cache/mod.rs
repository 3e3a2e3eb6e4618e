// Artifact cache: load-or-compute-and-persist.
//
// Every derived value in the pipeline flows through CacheStore. The contract
// (spelled out on `load_or_compute`) is the one invariant the orchestrator
// and the nPMI engine both rely on, so it lives in exactly one place.

pub mod codec;
pub mod store;

pub use store::{ArtifactStore, FsStore, MemoryStore};

use std::time::SystemTime;

use tracing::{debug, info};

use crate::corpus::DatasetIdentity;
use crate::error::Result;

/// Addresses one artifact: the dataset identity's cache directory plus the
/// artifact file name (which may carry a subdirectory, e.g. `npmi/he_pmi.csv`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    dir: String,
    name: String,
}

impl ArtifactKey {
    pub fn new(identity: &DatasetIdentity, name: &str) -> Self {
        Self {
            dir: identity.dir_name(),
            name: name.to_string(),
        }
    }

    /// The store key: `<identity_dir>/<artifact_name>`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.dir, self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A value that can round-trip through the artifact store.
///
/// Decoders must re-derive canonical column identity from legacy layouts
/// before giving up with a corruption error (see `codec`).
pub trait Artifact: Sized {
    fn encode(&self) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8], artifact: &str) -> Result<Self>;
}

/// Cache front-end: an artifact store plus the two policy flags.
pub struct CacheStore {
    store: Box<dyn ArtifactStore>,
    use_cache: bool,
    save: bool,
}

impl CacheStore {
    pub fn new(store: Box<dyn ArtifactStore>, use_cache: bool, save: bool) -> Self {
        Self {
            store,
            use_cache,
            save,
        }
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Load-or-compute, the single caching primitive.
    ///
    /// - `use_cache` and a persisted artifact exists: decode and return it,
    ///   bypassing `compute`.
    /// - otherwise, if `load_only`: return `Ok(None)` — callers tolerate the
    ///   absent result (dashboards render partial state).
    /// - otherwise: run `compute`, persist the result when `save`, return it.
    pub fn load_or_compute<T, F>(
        &self,
        key: &ArtifactKey,
        load_only: bool,
        compute: F,
    ) -> Result<Option<T>>
    where
        T: Artifact,
        F: FnOnce() -> Result<T>,
    {
        if let Some(cached) = self.load_cached(key)? {
            return Ok(Some(cached));
        }
        if load_only {
            debug!(artifact = %key.path(), "Not cached; load-only request returns absent");
            return Ok(None);
        }
        let value = compute()?;
        self.persist(key, &value)?;
        Ok(Some(value))
    }

    /// The load half of the primitive: `Some` only on a cache hit with
    /// `use_cache` set. Exposed for call sites whose compute step needs
    /// borrows the closure form cannot express.
    pub fn load_cached<T: Artifact>(&self, key: &ArtifactKey) -> Result<Option<T>> {
        if !self.use_cache {
            return Ok(None);
        }
        let Some(bytes) = self.store.get(&key.path())? else {
            return Ok(None);
        };
        let value = T::decode(&bytes, &key.path())?;
        info!(artifact = %key.path(), "Loaded cached artifact");
        Ok(Some(value))
    }

    /// The persist half of the primitive: a no-op unless `save` is set.
    pub fn persist<T: Artifact>(&self, key: &ArtifactKey, value: &T) -> Result<()> {
        if !self.save {
            return Ok(());
        }
        self.store.put(&key.path(), &value.encode()?)
    }

    /// Whether a persisted artifact would satisfy `load_cached`.
    pub fn is_cached(&self, key: &ArtifactKey) -> bool {
        self.use_cache && self.store.contains(&key.path())
    }

    /// Whether the key has a persisted artifact, regardless of `use_cache`.
    pub fn exists(&self, key: &ArtifactKey) -> bool {
        self.store.contains(&key.path())
    }

    pub fn modified(&self, key: &ArtifactKey) -> Option<SystemTime> {
        self.store.modified(&key.path())
    }
}
