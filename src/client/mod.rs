//! Backend access
//!
//! - [`routes`]: candidate paths for each logical read, single paths for writes
//! - [`EndpointProber`]: ordered fallback across candidates
//! - [`MarketplaceApi`]: typed reads and writes on top of the prober
//! - [`load_dashboard`]: concurrent reads that fail independently

mod api;
mod dashboard;
mod prober;
pub mod routes;

pub use api::MarketplaceApi;
pub use dashboard::{load_dashboard, Dashboard};
pub use prober::{EndpointProber, Probed};
