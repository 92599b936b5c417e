//! Loyalty tiers
//!
//! A member's accumulated points map to a named tier. The tier carries the
//! discount applied at checkout; progress toward the next tier is shown on
//! the cart and profile pages.
//!
//! ```text
//!   Bronze ──► Silver ──► Gold ──► Diamond
//!     0         1,000      5,000     10,000   (default thresholds)
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DiscountPercent, Money, Points};
use crate::{Result, StoreError};

/// Currency units that earn one point at a ratio of 1.
pub const POINT_UNIT: u32 = 1_000;

/// A named loyalty level with its entry threshold and discount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub name: String,
    pub min_points: u64,
    pub discount_percent: DiscountPercent,
}

impl LoyaltyTier {
    pub fn new(name: impl Into<String>, min_points: u64, discount_percent: DiscountPercent) -> Self {
        Self { name: name.into(), min_points, discount_percent }
    }
}

/// Validated, ascending set of tiers.
///
/// Construction is the only place misconfiguration is caught: once a table
/// exists, resolution can never fail for a non-negative balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierTable(Vec<LoyaltyTier>);

impl TierTable {
    pub fn new(mut tiers: Vec<LoyaltyTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(StoreError::invalid("tiers", "at least one tier is required"));
        }
        tiers.sort_by_key(|t| t.min_points);

        if tiers[0].min_points != 0 {
            return Err(StoreError::invalid("tiers", "no floor tier with min_points = 0"));
        }
        for pair in tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if lower.min_points == upper.min_points {
                return Err(StoreError::invalid(
                    "tiers",
                    format!("{} and {} share threshold {}", lower.name, upper.name, upper.min_points),
                ));
            }
            if upper.discount_percent < lower.discount_percent {
                return Err(StoreError::invalid(
                    "tiers",
                    format!("{} discount is lower than {}", upper.name, lower.name),
                ));
            }
        }
        Ok(Self(tiers))
    }

    /// Bronze / Silver / Gold / Diamond with the storefront's stock thresholds.
    pub fn standard() -> Self {
        Self(vec![
            LoyaltyTier::new("Bronze", 0, DiscountPercent::ZERO),
            LoyaltyTier::new("Silver", 1_000, DiscountPercent::capped(2)),
            LoyaltyTier::new("Gold", 5_000, DiscountPercent::capped(5)),
            LoyaltyTier::new("Diamond", 10_000, DiscountPercent::capped(10)),
        ])
    }

    /// Standard tier names and discounts with configurable entry thresholds.
    pub fn with_thresholds(silver: u64, gold: u64, diamond: u64) -> Result<Self> {
        Self::new(vec![
            LoyaltyTier::new("Bronze", 0, DiscountPercent::ZERO),
            LoyaltyTier::new("Silver", silver, DiscountPercent::capped(2)),
            LoyaltyTier::new("Gold", gold, DiscountPercent::capped(5)),
            LoyaltyTier::new("Diamond", diamond, DiscountPercent::capped(10)),
        ])
    }

    pub fn tiers(&self) -> &[LoyaltyTier] { &self.0 }

    pub fn find(&self, name: &str) -> Option<&LoyaltyTier> {
        self.0.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

impl<'de> Deserialize<'de> for TierTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tiers = Vec::<LoyaltyTier>::deserialize(deserializer)?;
        TierTable::new(tiers).map_err(serde::de::Error::custom)
    }
}

/// Where a balance sits in the tier table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TierStanding {
    pub points: u64,
    pub current_tier: LoyaltyTier,
    pub next_tier: Option<LoyaltyTier>,
    pub progress_percent: f64,
    pub points_to_next: u64,
}

impl TierStanding {
    pub fn discount_percent(&self) -> DiscountPercent { self.current_tier.discount_percent }
    pub fn is_top_tier(&self) -> bool { self.next_tier.is_none() }
}

/// Resolve a point balance against the tier table.
pub fn resolve_tier(points: i64, tiers: &TierTable) -> Result<TierStanding> {
    let points = Points::from_signed(points)?.value();
    let table = tiers.tiers();

    // Floor tier has min_points = 0, so at least one tier qualifies.
    let idx = table.partition_point(|t| t.min_points <= points).saturating_sub(1);
    let current = &table[idx];
    let next = table.get(idx + 1);

    let (progress_percent, points_to_next) = match next {
        None => (100.0, 0),
        Some(next) => {
            let span = (next.min_points - current.min_points) as f64;
            let progress = (points - current.min_points) as f64 * 100.0 / span;
            (progress.clamp(0.0, 100.0), next.min_points - points)
        }
    };

    Ok(TierStanding {
        points,
        current_tier: current.clone(),
        next_tier: next.cloned(),
        progress_percent,
        points_to_next,
    })
}

/// Discount applied to a subtotal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiscountBreakdown {
    pub subtotal: Money,
    pub discount_percent: DiscountPercent,
    pub discount_amount: Money,
    pub total: Money,
}

pub fn apply_discount(subtotal: &Money, pct: DiscountPercent) -> Result<DiscountBreakdown> {
    if subtotal.is_negative() {
        return Err(StoreError::invalid("subtotal", "must not be negative"));
    }
    let discount_amount = subtotal.percent(pct)?;
    let total = subtotal.saturating_sub(&discount_amount)?;
    Ok(DiscountBreakdown { subtotal: subtotal.clone(), discount_percent: pct, discount_amount, total })
}

/// How many points an order earns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsPolicy {
    /// Points per [`POINT_UNIT`] currency units.
    pub ratio: u32,
}

impl Default for PointsPolicy {
    fn default() -> Self { Self { ratio: 1 } }
}

impl PointsPolicy {
    pub fn new(ratio: u32) -> Self { Self { ratio } }

    /// `floor(amount / 1000 * ratio)`; zero for non-positive amounts.
    pub fn points_for(&self, amount: &Money) -> Result<u64> {
        if amount.amount() <= Decimal::ZERO {
            return Ok(0);
        }
        amount
            .amount()
            .checked_div(Decimal::from(POINT_UNIT))
            .and_then(|units| units.checked_mul(Decimal::from(self.ratio)))
            .and_then(|earned| earned.floor().to_u64())
            .ok_or_else(|| StoreError::invalid("points", format!("{amount} earns more points than can be held")))
    }
}
