//! Local cache reconciliation
//!
//! Records created on this client are kept under a storage key until the
//! server lists them. Merging is server-wins: a record the server returns
//! replaces the local copy entirely, and the local copy is pruned.

use crate::error::{ClientError, Result};
use crate::model::{EntityId, HarvestRecord};
use crate::storage::{read_json, write_json, KeyValueStore};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A record that can live in the local cache
pub trait CachedEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn entity_id(&self) -> &EntityId;
}

impl CachedEntity for HarvestRecord {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

/// Where a single displayed record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Created here, not yet listed by the server
    Local,
    Server,
}

/// Where a whole view came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The server answered; local-only records are merged in
    Server,
    /// The server could not serve the read; this is the cache alone
    LocalCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub record: T,
    pub source: Source,
}

/// Deduplicated records ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct MergedView<T> {
    pub records: Vec<Sourced<T>>,
    pub provenance: Provenance,
}

impl<T> MergedView<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the view was served from the local cache only
    pub fn is_possibly_incomplete(&self) -> bool {
        self.provenance == Provenance::LocalCache
    }

    /// Notice to show next to a locally-sourced view
    pub fn disclosure(&self) -> Option<&'static str> {
        self.is_possibly_incomplete()
            .then_some("Showing data saved on this device. It may be incomplete.")
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter().map(|sourced| &sourced.record)
    }

    pub fn into_records(self) -> Vec<T> {
        self.records.into_iter().map(|sourced| sourced.record).collect()
    }
}

/// Local cache of `T` bound to one storage key
pub struct LocalCacheReconciler<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    // Read-modify-write on the key happens under this lock
    guard: Mutex<()>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CachedEntity> LocalCacheReconciler<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            guard: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Everything currently cached, most recent first
    pub fn cached(&self) -> Result<Vec<T>> {
        read_json(self.store.as_ref(), self.key)
    }

    /// Cache a record just created on this client, ahead of older ones.
    ///
    /// An earlier cached copy with the same id is replaced.
    pub fn record_local(&self, entity: &T) -> Result<()> {
        let _guard = self.lock()?;
        let mut cached = self.cached()?;
        cached.retain(|existing| existing.entity_id() != entity.entity_id());
        cached.insert(0, entity.clone());
        write_json(self.store.as_ref(), self.key, &cached)?;
        debug!(key = self.key, entity_id = %entity.entity_id(), "Recorded entity locally");
        Ok(())
    }

    /// Replace the cached copy of an entity after an edit. Entities that are
    /// not cached stay uncached. Returns whether a copy was replaced.
    pub fn replace(&self, entity: &T) -> Result<bool> {
        let _guard = self.lock()?;
        let mut cached = self.cached()?;
        let Some(slot) = cached
            .iter_mut()
            .find(|existing| existing.entity_id() == entity.entity_id())
        else {
            return Ok(false);
        };
        *slot = entity.clone();
        write_json(self.store.as_ref(), self.key, &cached)?;
        debug!(key = self.key, entity_id = %entity.entity_id(), "Replaced cached entity");
        Ok(true)
    }

    /// Drop the cached copy of `id`, e.g. after it was deleted on the server.
    /// Returns whether a copy was removed.
    pub fn forget(&self, id: &EntityId) -> Result<bool> {
        let _guard = self.lock()?;
        let mut cached = self.cached()?;
        let before = cached.len();
        cached.retain(|existing| existing.entity_id() != id);
        if cached.len() == before {
            return Ok(false);
        }
        write_json(self.store.as_ref(), self.key, &cached)?;
        debug!(key = self.key, entity_id = %id, "Forgot cached entity");
        Ok(true)
    }

    /// Merge a fresh server list with the cache.
    ///
    /// Local-only records come first in cache order, then the server's.
    /// Cached records the server now lists are pruned from storage.
    pub fn reconcile(&self, server: Vec<T>) -> Result<MergedView<T>> {
        let _guard = self.lock()?;
        let cached = self.cached()?;

        let mut seen = HashSet::new();
        let server: Vec<T> = server
            .into_iter()
            .filter(|record| seen.insert(record.entity_id().clone()))
            .collect();

        let before = cached.len();
        let local_only: Vec<T> = cached
            .into_iter()
            .filter(|record| !seen.contains(record.entity_id()))
            .collect();

        if local_only.len() != before {
            debug!(
                key = self.key,
                pruned = before - local_only.len(),
                "Pruning locally cached records confirmed by the server"
            );
            if let Err(e) = write_json(self.store.as_ref(), self.key, &local_only) {
                warn!(key = self.key, error = %e, "Failed to prune local cache");
            }
        }

        let records = local_only
            .into_iter()
            .map(|record| Sourced {
                record,
                source: Source::Local,
            })
            .chain(server.into_iter().map(|record| Sourced {
                record,
                source: Source::Server,
            }))
            .collect();

        Ok(MergedView {
            records,
            provenance: Provenance::Server,
        })
    }

    /// The whole cache, tagged as locally sourced
    pub fn fallback(&self) -> Result<MergedView<T>> {
        let records = self
            .cached()?
            .into_iter()
            .map(|record| Sourced {
                record,
                source: Source::Local,
            })
            .collect();
        Ok(MergedView {
            records,
            provenance: Provenance::LocalCache,
        })
    }

    /// Turn the outcome of a server read into a view.
    ///
    /// Unsupported reads and unusable bodies degrade to the cache. Auth and
    /// network failures propagate.
    pub fn resolve(&self, fetched: Result<Vec<T>>) -> Result<MergedView<T>> {
        match fetched {
            Ok(server) => self.reconcile(server),
            Err(e) if e.allows_local_fallback() => {
                warn!(key = self.key, kind = %e.kind(), error = %e, "Serving local cache instead of server data");
                self.fallback()
            }
            Err(e) => Err(e),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| ClientError::Storage(format!("cache lock for {} poisoned", self.key)))
    }
}
