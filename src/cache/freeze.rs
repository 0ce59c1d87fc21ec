//! Freeze timestamps for elapsed-time counters
//!
//! A crop's counter runs from planting until it is harvested. The moment the
//! farmer marks it harvested the counter is frozen locally, so it stops at
//! that instant regardless of how long the server takes to confirm. Once
//! the server reports its own harvest time, that value wins and the local
//! freeze is deleted.

use crate::clock::Clock;
use crate::error::{ClientError, Result};
use crate::model::{parse_timestamp, CropRecord, EntityId};
use crate::storage::{keys, read_json, write_json, KeyValueStore};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Persisted as entity id → RFC 3339 timestamp
type FreezeTimes = BTreeMap<String, String>;

/// Where a crop's counter stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Server-reported harvest time
    Authoritative(DateTime<Utc>),
    /// Captured on this device when the crop was marked harvested
    Frozen(DateTime<Utc>),
}

impl Stop {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Authoritative(at) | Self::Frozen(at) => *at,
        }
    }
}

pub struct FreezeTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    guard: Mutex<()>,
}

impl FreezeTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            guard: Mutex::new(()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Freeze `id` at the current time. The first freeze wins.
    pub fn freeze_now(&self, id: &EntityId) -> Result<DateTime<Utc>> {
        self.freeze_at(id, self.clock.now())
    }

    /// Freeze `id` at `at` unless it is already frozen; returns the freeze in
    /// effect
    pub fn freeze_at(&self, id: &EntityId, at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let _guard = self.lock()?;
        let mut times = self.load()?;

        if let Some(existing) = times.get(id.as_str()).and_then(|raw| parse_timestamp(raw)) {
            return Ok(existing);
        }

        times.insert(id.to_string(), at.to_rfc3339_opts(SecondsFormat::Millis, true));
        write_json(self.store.as_ref(), keys::CROP_FREEZE_TIMES, &times)?;
        debug!(entity_id = %id, frozen_at = %at, "Froze elapsed-time counter");
        Ok(at)
    }

    pub fn frozen_at(&self, id: &EntityId) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .load()?
            .get(id.as_str())
            .and_then(|raw| parse_timestamp(raw)))
    }

    /// Remove the local freeze for `id`, e.g. when the status change that
    /// caused it was refused. Returns whether a freeze was removed.
    pub fn discard(&self, id: &EntityId) -> Result<bool> {
        let _guard = self.lock()?;
        let mut times = self.load()?;
        if times.remove(id.as_str()).is_none() {
            return Ok(false);
        }
        write_json(self.store.as_ref(), keys::CROP_FREEZE_TIMES, &times)?;
        debug!(entity_id = %id, "Discarded local freeze");
        Ok(true)
    }

    /// Drop the local freeze for `id` once the server reports its own stop
    /// time. Returns whether a local freeze was removed.
    pub fn clear_if_authoritative(
        &self,
        id: &EntityId,
        server_stop: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        if server_stop.is_none() {
            return Ok(false);
        }
        let _guard = self.lock()?;
        let mut times = self.load()?;
        if times.remove(id.as_str()).is_none() {
            return Ok(false);
        }
        write_json(self.store.as_ref(), keys::CROP_FREEZE_TIMES, &times)?;
        debug!(entity_id = %id, "Server stop time superseded local freeze");
        Ok(true)
    }

    /// Effective stop for each crop that has one.
    ///
    /// Server harvest times win and prune the matching local freezes in a
    /// single write. Other local freezes are kept.
    pub fn reconcile(&self, crops: &[CropRecord]) -> Result<HashMap<EntityId, Stop>> {
        let _guard = self.lock()?;
        let mut times = self.load()?;
        let mut pruned = false;
        let mut stops = HashMap::new();

        for crop in crops {
            if let Some(at) = crop.authoritative_stop() {
                pruned |= times.remove(crop.id.as_str()).is_some();
                stops.insert(crop.id.clone(), Stop::Authoritative(at));
            } else if let Some(at) = times.get(crop.id.as_str()).and_then(|raw| parse_timestamp(raw)) {
                stops.insert(crop.id.clone(), Stop::Frozen(at));
            }
        }

        if pruned {
            if let Err(e) = write_json(self.store.as_ref(), keys::CROP_FREEZE_TIMES, &times) {
                warn!(error = %e, "Failed to prune superseded freeze times");
            }
        }
        Ok(stops)
    }

    /// Time elapsed since `started_at`, up to `stop` or now
    pub fn elapsed(&self, started_at: DateTime<Utc>, stop: Option<DateTime<Utc>>) -> Duration {
        let end = stop.unwrap_or_else(|| self.clock.now());
        (end - started_at).max(Duration::zero())
    }

    fn load(&self) -> Result<FreezeTimes> {
        read_json(self.store.as_ref(), keys::CROP_FREEZE_TIMES)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| ClientError::Storage("freeze tracker lock poisoned".to_string()))
    }
}

/// Render as `1d 2h 3m 4s`, dropping leading zero units. Seconds always show.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}
