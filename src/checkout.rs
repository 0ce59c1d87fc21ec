//! Checkout
//!
//! The only operation that consumes the cart. The order goes to the server
//! first; the cart is cleared only after the server accepts it, so a failed
//! checkout can be retried as is.

use crate::client::MarketplaceApi;
use crate::error::{ClientError, Result};
use crate::stores::{CartStore, NotificationStore};
use crate::transport::Transport;
use serde_json::{json, Value};
use tracing::info;

/// What a successful checkout did
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    /// The server's response to the order, if it sent one
    pub order: Option<Value>,
    pub total: f64,
    pub items: u64,
    /// Owner contacts that were notified, one entry per line
    pub notified: Vec<String>,
}

/// Place an order for everything in the cart.
///
/// On success each line's seller gets a "New order" notification and the
/// cart is cleared. On failure the cart is left untouched.
pub async fn place_order<T: Transport>(
    api: &MarketplaceApi<T>,
    cart: &mut CartStore,
    notifications: &mut NotificationStore,
    token: Option<&str>,
) -> Result<CheckoutReceipt> {
    if cart.is_empty() {
        return Err(ClientError::ValidationFailed("the cart is empty".to_string()));
    }

    let summary = cart.summary();
    let order = api.place_order(&cart.order_items(), token).await?;

    let mut notified = Vec::new();
    for line in cart.lines() {
        let Some(owner) = line.owner_contact.as_deref() else {
            continue;
        };
        let message = format!("{} {} of {}", line.quantity, line.unit_of_measure, line.name);
        let meta = json!({ "productId": line.product_id, "qty": line.quantity });
        if notifications.append(owner, "New order", &message, meta).is_some() {
            notified.push(owner.trim().to_string());
        }
    }

    cart.clear();
    info!(
        lines = summary.lines,
        items = summary.items,
        notified = notified.len(),
        "Order placed"
    );

    Ok(CheckoutReceipt {
        order,
        total: summary.total,
        items: summary.items,
        notified,
    })
}
