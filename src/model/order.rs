//! Order payloads

use super::EntityId;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

/// One line of an order as the backend receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: EntityId,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: impl Into<EntityId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Reject empty orders and zero quantities
pub fn validate_order(items: &[OrderItem]) -> Result<()> {
    if items.is_empty() {
        return Err(ClientError::ValidationFailed("the order has no items".to_string()));
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(ClientError::ValidationFailed(format!(
            "quantity for product {} must be at least 1",
            item.product_id
        )));
    }
    Ok(())
}
