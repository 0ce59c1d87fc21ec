//! Local stores for purely client-side state
//!
//! Both stores are synchronous and never touch the network. Each owns one
//! storage key and rewrites it whole after every mutation; persistence
//! failures are logged and the in-memory state stays authoritative.

mod cart;
mod notifications;

pub use cart::{CartLine, CartStore, CartSummary};
pub use notifications::{NotificationRecord, NotificationStore};
