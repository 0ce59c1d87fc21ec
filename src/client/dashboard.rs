//! Farmer dashboard reads

use super::MarketplaceApi;
use crate::error::Result;
use crate::model::{CropRecord, HarvestRecord};
use crate::transport::Transport;
use tracing::warn;

/// Independent outcomes of the dashboard's reads.
///
/// A failed source does not void the others; each field is shown or
/// replaced by an empty state on its own.
#[derive(Debug)]
pub struct Dashboard {
    pub harvests: Result<Vec<HarvestRecord>>,
    pub crops: Result<Vec<CropRecord>>,
    pub sales_count: Result<u64>,
}

impl Dashboard {
    /// Whether every source loaded
    pub fn is_complete(&self) -> bool {
        self.harvests.is_ok() && self.crops.is_ok() && self.sales_count.is_ok()
    }

    pub fn harvest_count(&self) -> usize {
        self.harvests.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn crop_count(&self) -> usize {
        self.crops.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// Issue the dashboard reads concurrently and keep every outcome
pub async fn load_dashboard<T: Transport>(api: &MarketplaceApi<T>, token: Option<&str>) -> Dashboard {
    let (harvests, crops, sales_count) = tokio::join!(
        api.my_harvests(token),
        api.my_crops(token),
        api.sales_count(token),
    );

    for (source, error) in [
        ("harvests", harvests.as_ref().err()),
        ("crops", crops.as_ref().err()),
        ("sales_count", sales_count.as_ref().err()),
    ] {
        if let Some(error) = error {
            warn!(source, kind = %error.kind(), error = %error, "Dashboard source failed");
        }
    }

    Dashboard {
        harvests,
        crops,
        sales_count,
    }
}
