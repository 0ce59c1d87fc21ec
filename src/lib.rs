//! AgroLink SDK - resilient data access for the marketplace client
//!
//! Keeps the marketplace usable against a backend whose route names vary
//! between deployments and which cannot always list back what it accepted.
//!
//! # Architecture
//!
//! - **Prober**: each logical read has an ordered list of candidate paths;
//!   the first plausible response wins, auth rejections stop immediately
//! - **Reconciler**: records created here are cached locally and merged with
//!   server lists (server wins) until the server confirms them
//! - **Freeze tracker**: elapsed-time counters stop the instant a crop is
//!   marked harvested and converge to the server's timestamp later
//! - **Stores**: cart and per-recipient notifications, purely local
//!
//! Everything persistent goes through a [`KeyValueStore`]; everything on the
//! network goes through a [`Transport`]. Logging uses `tracing`; installing
//! a subscriber is left to the embedding application.
//!
//! # Example
//!
//! ```rust,ignore
//! use agrolink_sdk::{ClientConfig, HttpTransport, MarketplaceApi, HarvestLedger, FileStore};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env();
//! let api = Arc::new(MarketplaceApi::new(config.clone(), HttpTransport::new(&config)));
//! let store = Arc::new(FileStore::open("/var/lib/agrolink")?);
//!
//! let ledger = HarvestLedger::new(api, store);
//! let view = ledger.load(Some(&token)).await?;
//! if let Some(notice) = view.disclosure() {
//!     println!("{}", notice);
//! }
//! ```

// Error types
pub mod error;

// Configuration
pub mod config;

// Persistent key-value store
pub mod storage;

// Wall clock
pub mod clock;

// Network transport
pub mod transport;

// Typed records and normalization
pub mod model;

// Backend access: routes, prober, API
pub mod client;

// Local cache reconciliation and freeze tracking
pub mod cache;

// Cart and notifications
pub mod stores;

// Order placement
pub mod checkout;

// Background poller and ticker
pub mod timers;

// Re-export error types
pub use error::{ClientError, ErrorKind, Result};

pub use config::ClientConfig;

pub use storage::{open_store, FileStore, KeyValueStore, MemoryStore};

pub use clock::{Clock, ManualClock, SystemClock};

#[cfg(feature = "client")]
pub use transport::HttpTransport;
pub use transport::{MockTransport, Transport};

pub use model::{CropRecord, CropStatus, EntityId, HarvestRecord, NewHarvest, NewProduct, OrderItem, ProductRecord};

pub use client::{load_dashboard, Dashboard, EndpointProber, MarketplaceApi, Probed};

pub use cache::{
    format_elapsed, CropBoard, CropTimer, FreezeTracker, HarvestLedger, LocalCacheReconciler, MergedView,
    Provenance, Source, Sourced,
};

pub use stores::{CartLine, CartStore, NotificationRecord, NotificationStore};

pub use checkout::{place_order, CheckoutReceipt};

pub use timers::{spawn_ticker, spawn_unread_poller, PeriodicTask};
