//! Aggregates module
pub mod order;
pub mod cart;

pub use order::{LineItem, Order, ShippingInfo};
pub use cart::{Cart, CartItem, CheckoutQuote};
