//! Marketplace products

use super::EntityId;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_per_unit: f64,
    pub unit_of_measure: String,
    /// Units available for sale; `None` when the backend does not say
    pub available_stock: Option<u32>,
    /// Contact of the farmer selling the product
    pub owner_contact: Option<String>,
}

impl ProductRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, price_per_unit: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price_per_unit,
            unit_of_measure: "kg".to_string(),
            available_stock: None,
            owner_contact: None,
        }
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.available_stock = Some(stock);
        self
    }

    pub fn with_owner(mut self, contact: impl Into<String>) -> Self {
        self.owner_contact = Some(contact.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = unit.into();
        self
    }
}

/// Payload for publishing a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_per_unit: f64,
    pub unit_of_measure: String,
    pub available_stock: u32,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::ValidationFailed("a product name is required".to_string()));
        }
        if !self.price_per_unit.is_finite() || self.price_per_unit <= 0.0 {
            return Err(ClientError::ValidationFailed(
                "price must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
