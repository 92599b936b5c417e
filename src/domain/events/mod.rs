//! Domain events
//!
//! Raised by the order aggregate for the systems that own stock and the
//! points ledger. Nothing in this crate applies them.
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, customer_id: String, points_pending: u64 },
    Shipped { order_id: String },
    /// Stock for each `(product_id, quantity)` goes back on the shelf.
    Cancelled { order_id: String, restock: Vec<(String, u32)> },
    Completed { order_id: String, customer_id: String, points_awarded: u64 },
    Returned { order_id: String, customer_id: String, points_revoked: u64 },
}
