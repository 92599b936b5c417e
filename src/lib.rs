//! Coursebook Store - loyalty and order lifecycle rules
//!
//! Business rules behind the course-material storefront: the pieces that
//! cart, checkout and order management must agree on between the browser
//! and the server.
//!
//! ## Features
//! - Loyalty tier resolution (points to tier, discount and progress)
//! - Checkout pricing with the member discount applied
//! - Points earned per order
//! - Order status guard with a 7-day return window
//! - Stateless HTTP surface mirroring the guard server-side

use thiserror::Error;

pub mod api;
pub mod config;
pub mod db;
pub mod domain;

pub use domain::lifecycle::{can_cancel, can_cancel_raw, can_return, Actor, OrderAction, OrderStatus};
pub use domain::loyalty::{resolve_tier, LoyaltyTier, PointsPolicy, TierStanding, TierTable};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Cannot {action} an order that is {status}")]
    TransitionNotAllowed { status: String, action: String },

    #[error("Currency mismatch: {0} vs {1}")]
    CurrencyMismatch(String, String),
}

impl StoreError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::invalid("points", "must not be negative");
        assert_eq!(err.to_string(), "Invalid points: must not be negative");

        let err = StoreError::TransitionNotAllowed { status: "completed".into(), action: "cancel".into() };
        assert_eq!(err.to_string(), "Cannot cancel an order that is completed");
    }
}
