//! Shopping cart
//!
//! Lines are unique per product, quantities stay within `1..=stock` when the
//! stock is known, and the whole cart is rewritten to storage after every
//! mutation.

use crate::error::{ClientError, Result};
use crate::model::{EntityId, OrderItem, ProductRecord};
use crate::storage::{keys, read_json, write_json, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: EntityId,
    pub name: String,
    pub price_per_unit: f64,
    pub unit_of_measure: String,
    #[serde(default)]
    pub available_stock: Option<u32>,
    /// Contact of the farmer who sells the product; notified on checkout
    #[serde(default)]
    pub owner_contact: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        self.price_per_unit * f64::from(self.quantity)
    }

    fn clamp(&self, quantity: u32) -> u32 {
        let capped = match self.available_stock {
            Some(stock) => quantity.min(stock),
            None => quantity,
        };
        capped.max(1)
    }
}

/// Totals for the cart badge and checkout footer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartSummary {
    pub lines: usize,
    pub items: u64,
    pub total: f64,
}

pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Load the persisted cart. An unreadable cart starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let lines = read_json(store.as_ref(), keys::CART).unwrap_or_else(|e| {
            warn!(key = keys::CART, error = %e, "Could not load cart, starting empty");
            Vec::new()
        });
        Self { store, lines }
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Returns the line's resulting quantity. A zero quantity is rejected
    /// like any other quantity below 1.
    pub fn add_item(&mut self, product: &ProductRecord, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(ClientError::ValidationFailed(
                "quantity must be at least 1".to_string(),
            ));
        }
        if product.available_stock == Some(0) {
            return Err(ClientError::ValidationFailed(format!(
                "{} is out of stock",
                product.name
            )));
        }

        let resulting = match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => {
                if product.available_stock.is_some() {
                    line.available_stock = product.available_stock;
                }
                line.quantity = line.clamp(line.quantity.saturating_add(quantity));
                line.quantity
            }
            None => {
                let mut line = CartLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    price_per_unit: product.price_per_unit,
                    unit_of_measure: product.unit_of_measure.clone(),
                    available_stock: product.available_stock,
                    owner_contact: product.owner_contact.clone(),
                    quantity,
                };
                line.quantity = line.clamp(quantity);
                let resulting = line.quantity;
                self.lines.push(line);
                resulting
            }
        };

        debug!(entity_id = %product.id, quantity = resulting, "Cart line updated");
        self.persist();
        Ok(resulting)
    }

    /// Set a line's quantity.
    ///
    /// Values below 1, NaN and infinities are rejected and the line keeps its
    /// quantity. Fractions are truncated; values above stock are clamped.
    pub fn update_quantity(&mut self, product_id: &EntityId, quantity: f64) -> Result<u32> {
        if !quantity.is_finite() || quantity < 1.0 {
            return Err(ClientError::ValidationFailed(format!(
                "quantity must be a number of at least 1, got {}",
                quantity
            )));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
            .ok_or_else(|| {
                ClientError::ValidationFailed(format!("product {} is not in the cart", product_id))
            })?;

        let requested = quantity.min(f64::from(u32::MAX)) as u32;
        line.quantity = line.clamp(requested);
        let resulting = line.quantity;
        self.persist();
        Ok(resulting)
    }

    /// [`update_quantity`](Self::update_quantity) from raw form input
    pub fn update_quantity_input(&mut self, product_id: &EntityId, input: &str) -> Result<u32> {
        let quantity: f64 = input.trim().parse().map_err(|_| {
            ClientError::ValidationFailed(format!("'{}' is not a quantity", input.trim()))
        })?;
        self.update_quantity(product_id, quantity)
    }

    /// Returns whether a line was removed
    pub fn remove_item(&mut self, product_id: &EntityId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        let removed = self.lines.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &EntityId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Units across all lines
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self.lines.len(),
            items: self.count(),
            total: self.total(),
        }
    }

    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem::new(line.product_id.clone(), line.quantity))
            .collect()
    }

    fn persist(&self) {
        if let Err(e) = write_json(self.store.as_ref(), keys::CART, &self.lines) {
            warn!(key = keys::CART, error = %e, "Failed to persist cart");
        }
    }
}
