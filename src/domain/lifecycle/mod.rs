//! Order lifecycle guard
//!
//! ```text
//!   pending ──► shipping ──► completed ──► returned
//!      │            │        (≤ 7 days)
//!      └────────────┴──► cancelled
//! ```
//!
//! The guard only answers "is this allowed right now". Persisting the new
//! status belongs to whoever owns the order row, and must re-run the guard
//! before committing.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Result, StoreError};

pub const RETURN_WINDOW_DAYS: i64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { Pending, Shipping, Completed, Cancelled, Returned }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipping => "shipping",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
        }
    }

    /// No action is ever offered again.
    pub fn is_terminal(&self) -> bool { matches!(self, Self::Cancelled | Self::Returned) }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "shipping" => Ok(Self::Shipping),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "returned" => Ok(Self::Returned),
            other => Err(StoreError::invalid("status", format!("unknown order status '{other}'"))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderAction { Cancel, MarkShipping, Receive, Return }

impl OrderAction {
    pub const ALL: [OrderAction; 4] = [Self::Cancel, Self::MarkShipping, Self::Receive, Self::Return];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::MarkShipping => "mark-shipping",
            Self::Receive => "receive",
            Self::Return => "return",
        }
    }

    pub fn target(&self) -> OrderStatus {
        match self {
            Self::Cancel => OrderStatus::Cancelled,
            Self::MarkShipping => OrderStatus::Shipping,
            Self::Receive => OrderStatus::Completed,
            Self::Return => OrderStatus::Returned,
        }
    }
}

impl FromStr for OrderAction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| StoreError::invalid("action", format!("unknown order action '{s}'")))
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Who is asking. Establishing this is the caller's job (session, token).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor { #[default] Customer, Admin }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { #[default] Cod, BankTransfer }

impl FromStr for PaymentMethod {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "bank_transfer" | "banking" | "qr" => Ok(Self::BankTransfer),
            other => Err(StoreError::invalid("payment_method", format!("unknown payment method '{other}'"))),
        }
    }
}

/// The fields of an order the guard looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl OrderSnapshot {
    /// A return is open only for a completed order still inside the window.
    pub fn can_return(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Completed && can_return(self.created_at, now)
    }

    pub fn return_days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.status != OrderStatus::Completed { return None; }
        return_days_remaining(self.created_at, now)
    }
}

/// Whole days since `created_at`, rounded up. A timestamp in the future is
/// rejected rather than counted as day zero.
pub fn elapsed_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<i64> {
    let elapsed = now - created_at;
    if elapsed < Duration::zero() {
        return Err(StoreError::invalid("created_at", format!("{created_at} is after {now}")));
    }
    let whole = elapsed.num_days();
    Ok(if elapsed > Duration::days(whole) { whole + 1 } else { whole })
}

pub fn check_return(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
    Ok(elapsed_days(created_at, now)? <= RETURN_WINDOW_DAYS)
}

/// True while the order is inside the return window. Fails closed on a
/// malformed (future) `created_at`.
pub fn can_return(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    check_return(created_at, now).unwrap_or(false)
}

/// Days left to request a return, if any.
pub fn return_days_remaining(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    elapsed_days(created_at, now).ok().map(|d| RETURN_WINDOW_DAYS - d).filter(|d| *d >= 0)
}

pub fn can_cancel(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::Shipping)
}

/// Same as [`can_cancel`] for an unparsed status; unknown values are refused.
pub fn can_cancel_raw(status: &str) -> bool {
    status.parse::<OrderStatus>().map(can_cancel).unwrap_or(false)
}

pub fn is_permitted(order: &OrderSnapshot, action: OrderAction, actor: Actor, now: DateTime<Utc>) -> bool {
    use OrderAction::*;
    use OrderStatus::*;

    match (order.status, action) {
        (Pending | Shipping, Cancel) => true,
        (Pending, MarkShipping) => actor == Actor::Admin,
        // COD settles at handoff, so only staff can confirm it.
        (Shipping, Receive) => actor == Actor::Admin || order.payment_method != PaymentMethod::Cod,
        (Completed, Return) => order.can_return(now),
        _ => false,
    }
}

/// Actions currently offered for the order, in display order.
pub fn permitted_actions(order: &OrderSnapshot, actor: Actor, now: DateTime<Utc>) -> Vec<OrderAction> {
    OrderAction::ALL.into_iter().filter(|a| is_permitted(order, *a, actor, now)).collect()
}

/// Status the order moves to, or why it cannot.
pub fn transition(order: &OrderSnapshot, action: OrderAction, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> {
    if order.status == OrderStatus::Completed && action == OrderAction::Return {
        // Surface a bad timestamp as such instead of a plain refusal.
        check_return(order.created_at, now)?;
    }
    if !is_permitted(order, action, actor, now) {
        return Err(StoreError::TransitionNotAllowed {
            status: order.status.to_string(),
            action: action.to_string(),
        });
    }
    Ok(action.target())
}

/// Accepts RFC 3339 as well as the zone-less `YYYY-MM-DD[T ]HH:MM:SS` the
/// orders table stores (read as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| StoreError::invalid("created_at", format!("'{raw}' is not a timestamp")))
}
