//! Crop board: crops with their elapsed-time counters

use super::freeze::{format_elapsed, FreezeTracker, Stop};
use crate::client::MarketplaceApi;
use crate::clock::Clock;
use crate::error::Result;
use crate::model::{CropRecord, CropStatus, EntityId};
use crate::storage::KeyValueStore;
use crate::transport::Transport;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// A crop and where its counter stops, if anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct CropTimer {
    pub crop: CropRecord,
    pub stop: Option<Stop>,
}

impl CropTimer {
    /// Elapsed since planting at `now`, or `None` without a planting date
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let started = self.crop.planting_date?;
        let end = self.stop.map(|stop| stop.at()).unwrap_or(now);
        Some((end - started).max(Duration::zero()))
    }

    pub fn display_at(&self, now: DateTime<Utc>) -> String {
        self.elapsed_at(now)
            .map(format_elapsed)
            .unwrap_or_else(|| "-".to_string())
    }
}

pub struct CropBoard<T> {
    api: Arc<MarketplaceApi<T>>,
    tracker: FreezeTracker,
}

impl<T: Transport> CropBoard<T> {
    pub fn new(api: Arc<MarketplaceApi<T>>, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            tracker: FreezeTracker::new(store, clock),
        }
    }

    pub fn tracker(&self) -> &FreezeTracker {
        &self.tracker
    }

    /// Load crops and resolve each counter's stop
    pub async fn load(&self, token: Option<&str>) -> Result<Vec<CropTimer>> {
        let crops = self.api.my_crops(token).await?;
        let mut stops = self.tracker.reconcile(&crops)?;
        Ok(crops
            .into_iter()
            .map(|crop| {
                let stop = stops.remove(&crop.id);
                CropTimer { crop, stop }
            })
            .collect())
    }

    /// Mark a crop harvested.
    ///
    /// The counter is frozen and persisted before the request goes out, so it
    /// stops while the request is in flight. A refused change removes the
    /// freeze again unless it predates this call.
    pub async fn mark_harvested(&self, id: &EntityId, token: Option<&str>) -> Result<DateTime<Utc>> {
        let existing = self.tracker.frozen_at(id)?;
        let frozen = self.tracker.freeze_now(id)?;

        if let Err(e) = self
            .api
            .update_crop_status(id, &CropStatus::Harvested, token)
            .await
        {
            if existing.is_none() {
                if let Err(discard_err) = self.tracker.discard(id) {
                    warn!(entity_id = %id, error = %discard_err, "Failed to discard freeze");
                }
            }
            return Err(e);
        }

        info!(entity_id = %id, frozen_at = %frozen, "Crop marked harvested");
        Ok(frozen)
    }
}
