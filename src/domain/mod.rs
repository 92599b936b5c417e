//! Domain layer
pub mod aggregates;
pub mod events;
pub mod lifecycle;
pub mod loyalty;
pub mod value_objects;
