//! HTTP surface
//!
//! Stateless evaluation endpoints: the order service calls these (or links
//! the library directly) before committing a status change, so the browser's
//! copy of the rules is never the one that counts.

use std::sync::Arc;

use axum::{routing::{get, post}, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::loyalty::{PointsPolicy, TierTable};

pub mod error;
mod extract;
mod handlers;

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery};

/// Immutable per-process state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub tiers: Arc<TierTable>,
    pub points: PointsPolicy,
}

impl AppState {
    pub fn new(tiers: TierTable, points: PointsPolicy) -> Self {
        Self { tiers: Arc::new(tiers), points }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "coursebook-store"})) }))
        .route("/api/v1/loyalty/tiers", get(handlers::list_tiers))
        .route("/api/v1/loyalty/standing", get(handlers::standing))
        .route("/api/v1/checkout/quote", post(handlers::quote))
        .route("/api/v1/orders/actions", post(handlers::order_actions))
        .route("/api/v1/orders/transition", post(handlers::order_transition))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}
