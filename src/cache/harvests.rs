//! Harvest ledger
//!
//! Some deployments accept new harvests but cannot list them back. The
//! ledger caches every harvest it registers and merges that cache with the
//! server list whenever the server can provide one.

use super::reconcile::{LocalCacheReconciler, MergedView};
use crate::client::MarketplaceApi;
use crate::error::Result;
use crate::model::{CropStatus, EntityId, HarvestRecord, NewHarvest};
use crate::storage::{keys, KeyValueStore};
use crate::transport::Transport;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct HarvestLedger<T> {
    api: Arc<MarketplaceApi<T>>,
    cache: LocalCacheReconciler<HarvestRecord>,
}

impl<T: Transport> HarvestLedger<T> {
    pub fn new(api: Arc<MarketplaceApi<T>>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            cache: LocalCacheReconciler::new(store, keys::LOCAL_HARVESTS),
        }
    }

    pub fn cache(&self) -> &LocalCacheReconciler<HarvestRecord> {
        &self.cache
    }

    /// Register a harvest with the server, then keep it locally until the
    /// server lists it.
    ///
    /// A failed write caches nothing. Once registered, the harvested crop is
    /// moved to `Harvested`; a failure there is only logged.
    pub async fn register(&self, harvest: NewHarvest, token: Option<&str>) -> Result<HarvestRecord> {
        let crop_id = harvest.crop_id.clone();
        let record = self.api.create_harvest(harvest, token).await?;
        if let Err(e) = self.cache.record_local(&record) {
            warn!(entity_id = %record.id, error = %e, "Harvest registered but not cached locally");
        }

        if let Err(e) = self
            .api
            .update_crop_status(&crop_id, &CropStatus::Harvested, token)
            .await
        {
            warn!(entity_id = %crop_id, error = %e, "Harvest registered but crop status not updated");
        }
        Ok(record)
    }

    /// Edit a harvest on the server. A locally cached copy is replaced with
    /// the edited record.
    pub async fn update(
        &self,
        id: &EntityId,
        harvest: NewHarvest,
        token: Option<&str>,
    ) -> Result<HarvestRecord> {
        let record = self.api.update_harvest(id, harvest, token).await?;
        if let Err(e) = self.cache.replace(&record) {
            warn!(entity_id = %id, error = %e, "Harvest updated but cached copy is stale");
        }
        Ok(record)
    }

    /// Delete a harvest on the server and drop any cached copy, so it does
    /// not reappear when the cache is served alone.
    pub async fn delete(&self, id: &EntityId, token: Option<&str>) -> Result<()> {
        self.api.delete_harvest(id, token).await?;
        self.cache.forget(id)?;
        Ok(())
    }

    /// Current harvests: server list merged with the local cache, or the
    /// cache alone when the server cannot serve the read
    pub async fn load(&self, token: Option<&str>) -> Result<MergedView<HarvestRecord>> {
        let fetched = self.api.my_harvests(token).await;
        self.cache.resolve(fetched)
    }

    /// Fill in missing crop names by fetching each referenced crop once.
    ///
    /// Lookups run concurrently; a failed lookup leaves its harvests unnamed.
    /// Returns how many records were named.
    pub async fn enrich_crop_names(
        &self,
        view: &mut MergedView<HarvestRecord>,
        token: Option<&str>,
    ) -> usize {
        let missing: BTreeSet<EntityId> = view
            .records
            .iter()
            .filter(|sourced| sourced.record.crop_name.is_none())
            .filter_map(|sourced| sourced.record.crop_id.clone())
            .collect();
        if missing.is_empty() {
            return 0;
        }

        let lookups = missing.iter().map(|id| async move {
            let outcome = self.api.crop_by_id(id, token).await;
            (id, outcome)
        });

        let names: HashMap<&EntityId, String> = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, outcome)| match outcome {
                Ok(crop) => Some((id, crop.name)),
                Err(e) => {
                    debug!(entity_id = %id, error = %e, "Crop name lookup failed");
                    None
                }
            })
            .collect();

        let mut named = 0;
        for sourced in view.records.iter_mut() {
            let record = &mut sourced.record;
            if record.crop_name.is_some() {
                continue;
            }
            if let Some(name) = record.crop_id.as_ref().and_then(|id| names.get(id)) {
                record.crop_name = Some(name.clone());
                named += 1;
            }
        }
        named
    }
}
