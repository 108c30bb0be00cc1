//! Read-through snapshot cache in front of pet and shelter reads.
//!
//! Entries carry no expiry. They stay until a mutation invalidates them, so every write path
//! in the catalog and adoption workflows is responsible for calling one of the `invalidate_*`
//! methods after its transaction commits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pet,
    Shelter,
}

impl ResourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            ResourceKind::Pet => "pet",
            ResourceKind::Shelter => "shelter",
        }
    }
}

/// `(resource, id)` for single entities, `(resource, signature)` for listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Entity(ResourceKind, u64),
    Listing(ResourceKind, String),
}

impl CacheKey {
    pub fn kind(&self) -> ResourceKind {
        match self {
            CacheKey::Entity(kind, _) | CacheKey::Listing(kind, _) => *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
pub struct ReadThroughCache {
    enabled: bool,
    entries: RwLock<HashMap<CacheKey, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ReadThroughCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadThroughCache {
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// A cache that never stores anything; every read goes to the loader.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_enabled(config.enabled)
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached snapshot for `key`, or run `load`, store its result and return it.
    /// Loader errors pass through untouched and are never cached.
    pub fn read_through<T, E>(&self, key: CacheKey, load: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(value) = self.lookup::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let value = load()?;
        if self.enabled {
            match serde_json::to_string(&value) {
                Ok(snapshot) => {
                    self.write().insert(key, snapshot);
                }
                Err(error) => {
                    warn!(?key, %error, "snapshot not cached; serialization failed");
                }
            }
        }
        Ok(value)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let snapshot = self.read().get(key).cloned()?;
        match serde_json::from_str(&snapshot) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(?key, %error, "evicting unreadable snapshot");
                self.write().remove(key);
                None
            }
        }
    }

    pub fn invalidate(&self, key: &CacheKey) {
        if self.write().remove(key).is_some() {
            debug!(?key, "cache entry invalidated");
        }
    }

    pub fn invalidate_entity(&self, kind: ResourceKind, id: u64) {
        self.invalidate(&CacheKey::Entity(kind, id));
    }

    /// Drop every listing snapshot of `kind`, leaving entity entries alone.
    pub fn invalidate_listings(&self, kind: ResourceKind) {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !matches!(key, CacheKey::Listing(listed, _) if *listed == kind));
        debug!(
            resource = kind.label(),
            dropped = before - entries.len(),
            "listing snapshots invalidated"
        );
    }

    /// Drop every entity and listing snapshot of `kind`.
    pub fn invalidate_kind(&self, kind: ResourceKind) {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| key.kind() != kind);
        debug!(
            resource = kind.label(),
            dropped = before - entries.len(),
            "all snapshots invalidated"
        );
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.read().len(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, String>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("cache lock poisoned; continuing with recovered entries");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, String>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("cache lock poisoned; continuing with recovered entries");
            poisoned.into_inner()
        })
    }
}
