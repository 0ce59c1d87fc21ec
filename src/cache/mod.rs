//! Client-side caches over the persistent key-value store
//!
//! - [`LocalCacheReconciler`]: locally created records merged with server lists
//! - [`HarvestLedger`]: harvests registered here, cached until the server lists them
//! - [`FreezeTracker`] and [`CropBoard`]: elapsed-time counters that stop on harvest

mod crops;
mod freeze;
mod harvests;
mod reconcile;

pub use crops::{CropBoard, CropTimer};
pub use freeze::{format_elapsed, FreezeTracker, Stop};
pub use harvests::HarvestLedger;
pub use reconcile::{CachedEntity, LocalCacheReconciler, MergedView, Provenance, Source, Sourced};
