use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ApiJson, ApiQuery, AppState};
use crate::domain::aggregates::{Cart, CartItem, CheckoutQuote};
use crate::domain::lifecycle::{self, Actor, OrderAction, OrderSnapshot, OrderStatus, PaymentMethod};
use crate::domain::loyalty::{resolve_tier, TierStanding, TierTable};
use crate::domain::value_objects::{DiscountPercent, Money, DEFAULT_CURRENCY};

pub async fn list_tiers(State(s): State<AppState>) -> Json<TierTable> {
    Json(s.tiers.as_ref().clone())
}

#[derive(Debug, Deserialize)] pub struct StandingParams { pub points: i64 }
#[derive(Debug, Serialize)] pub struct StandingResponse { #[serde(flatten)] pub standing: TierStanding, pub discount_percent: DiscountPercent }

pub async fn standing(State(s): State<AppState>, ApiQuery(p): ApiQuery<StandingParams>) -> Result<Json<StandingResponse>, ApiError> {
    let standing = resolve_tier(p.points, &s.tiers)?;
    Ok(Json(StandingResponse { discount_percent: standing.discount_percent(), standing }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    pub points: i64,
    #[validate(length(min = 1, message = "cart is empty"))]
    pub items: Vec<QuoteItem>,
    pub currency: Option<String>,
    /// Level stored on the account, if the caller has one. Only compared, never priced from.
    pub stored_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct QuoteItem {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: CheckoutQuote,
    pub standing: TierStanding,
    pub stored_level_matches: Option<bool>,
}

pub async fn quote(State(s): State<AppState>, ApiJson(r): ApiJson<QuoteRequest>) -> Result<Json<QuoteResponse>, ApiError> {
    r.validate()?;
    for item in &r.items { item.validate()?; }
    let standing = resolve_tier(r.points, &s.tiers)?;
    let currency = r.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

    let mut cart = Cart::new(currency);
    for item in r.items {
        cart.add_item(CartItem {
            product_id: item.product_id, name: item.name, quantity: item.quantity,
            unit_price: Money::new(item.unit_price, currency),
        })?;
    }
    let quote = cart.quote(&standing, &s.points)?;

    let stored_level_matches = r.stored_level.as_deref().map(|level| level.eq_ignore_ascii_case(&standing.current_tier.name));
    if stored_level_matches == Some(false) {
        tracing::warn!(points = standing.points, tier = %standing.current_tier.name, stored_level = ?r.stored_level, "stored level disagrees with point balance");
    }
    Ok(Json(QuoteResponse { quote, standing, stored_level_matches }))
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub status: String,
    pub created_at: String,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub actor: Actor,
    pub action: Option<String>,
}

impl OrderRequest {
    fn snapshot(&self) -> Result<OrderSnapshot, ApiError> {
        let payment_method = match &self.payment_method {
            Some(raw) => raw.parse()?,
            None => PaymentMethod::default(),
        };
        Ok(OrderSnapshot {
            status: self.status.parse()?,
            created_at: lifecycle::parse_timestamp(&self.created_at)?,
            payment_method,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub status: OrderStatus,
    pub permitted_actions: Vec<OrderAction>,
    pub can_cancel: bool,
    pub can_return: bool,
    pub return_days_remaining: Option<i64>,
}

fn describe(order: &OrderSnapshot, actor: Actor, now: DateTime<Utc>) -> ActionsResponse {
    ActionsResponse {
        status: order.status,
        permitted_actions: lifecycle::permitted_actions(order, actor, now),
        can_cancel: lifecycle::can_cancel(order.status),
        can_return: order.can_return(now),
        return_days_remaining: order.return_days_remaining(now),
    }
}

pub async fn order_actions(ApiJson(r): ApiJson<OrderRequest>) -> Result<Json<ActionsResponse>, ApiError> {
    let now = Utc::now();
    let order = r.snapshot()?;
    Ok(Json(describe(&order, r.actor, now)))
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub from: OrderStatus,
    #[serde(flatten)]
    pub next: ActionsResponse,
}

pub async fn order_transition(ApiJson(r): ApiJson<OrderRequest>) -> Result<Json<TransitionResponse>, ApiError> {
    let now = Utc::now();
    let order = r.snapshot()?;
    let action: OrderAction = r.action.as_deref().ok_or_else(|| ApiError::BadRequest("action is required".into()))?.parse()?;

    let to = lifecycle::transition(&order, action, r.actor, now)?;
    tracing::info!(from = %order.status, %to, %action, actor = ?r.actor, "order transition approved");
    let next = OrderSnapshot { status: to, ..order };
    Ok(Json(TransitionResponse { from: order.status, next: describe(&next, r.actor, now) }))
}
