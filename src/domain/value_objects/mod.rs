//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, StoreError};

pub const DEFAULT_CURRENCY: &str = "VND";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn vnd(amount: Decimal) -> Self { Self::new(amount, DEFAULT_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_negative(&self) -> bool { self.amount.is_sign_negative() && !self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money> {
        self.same_currency(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or_else(out_of_range)?;
        Ok(Money::new(amount, &self.currency))
    }

    /// Never goes below zero.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money> {
        self.same_currency(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or_else(out_of_range)?;
        Ok(Money::new(amount.max(Decimal::ZERO), &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Result<Money> {
        let amount = self.amount.checked_mul(Decimal::from(qty)).ok_or_else(out_of_range)?;
        Ok(Money::new(amount, &self.currency))
    }

    pub fn percent(&self, pct: DiscountPercent) -> Result<Money> {
        let amount = pct
            .value()
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|fraction| self.amount.checked_mul(fraction))
            .ok_or_else(out_of_range)?;
        Ok(Money::new(amount, &self.currency))
    }

    fn same_currency(&self, other: &Money) -> Result<()> {
        if self.currency != other.currency {
            return Err(StoreError::CurrencyMismatch(self.currency.clone(), other.currency.clone()));
        }
        Ok(())
    }
}

fn out_of_range() -> StoreError { StoreError::invalid("amount", "out of range") }

impl Default for Money { fn default() -> Self { Self::zero(DEFAULT_CURRENCY) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount.normalize(), self.currency) }
}

/// Discount percentage, always within [0, 100]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(StoreError::invalid("discount_percent", format!("{value} is outside 0..=100")));
        }
        Ok(Self(value))
    }

    pub fn from_whole(value: u32) -> Result<Self> { Self::new(Decimal::from(value)) }
    /// Whole percentage, clamped to 100.
    pub fn capped(value: u8) -> Self { Self(Decimal::from(value.min(100))) }
    pub fn value(&self) -> Decimal { self.0 }
}

impl TryFrom<Decimal> for DiscountPercent {
    type Error = StoreError;
    fn try_from(value: Decimal) -> Result<Self> { Self::new(value) }
}

impl From<DiscountPercent> for Decimal {
    fn from(value: DiscountPercent) -> Self { value.0 }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0.normalize()) }
}

/// Loyalty point balance. Non-negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Points(u64);

impl Points {
    pub fn new(value: u64) -> Self { Self(value) }

    pub fn from_signed(value: i64) -> Result<Self> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| StoreError::invalid("points", format!("{value} is negative")))
    }

    pub fn value(&self) -> u64 { self.0 }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} pts", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::vnd(Decimal::new(100_000, 0));
        let b = Money::vnd(Decimal::new(50_000, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150_000, 0));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::vnd(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "USD");
        assert_eq!(a.add(&b), Err(StoreError::CurrencyMismatch("VND".into(), "USD".into())));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::vnd(Decimal::new(10, 0));
        let b = Money::vnd(Decimal::new(25, 0));
        assert_eq!(a.saturating_sub(&b).unwrap().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_percent_of_money() {
        let subtotal = Money::vnd(Decimal::new(200_000, 0));
        let pct = DiscountPercent::from_whole(5).unwrap();
        assert_eq!(subtotal.percent(pct).unwrap().amount(), Decimal::new(10_000, 0));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Money::vnd(Decimal::MAX);
        assert!(matches!(huge.multiply(2), Err(StoreError::InvalidInput { .. })));
        assert!(matches!(huge.add(&Money::vnd(Decimal::ONE)), Err(StoreError::InvalidInput { .. })));
        assert!(huge.multiply(1).is_ok());
        assert!(huge.percent(DiscountPercent::from_whole(100).unwrap()).is_ok());
    }

    #[test]
    fn test_discount_percent_bounds() {
        assert!(DiscountPercent::from_whole(0).is_ok());
        assert!(DiscountPercent::from_whole(100).is_ok());
        assert!(DiscountPercent::from_whole(101).is_err());
        assert!(DiscountPercent::new(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_discount_percent_rejects_out_of_range_json() {
        let parsed: std::result::Result<DiscountPercent, _> = serde_json::from_str("\"150\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_points_from_signed() {
        assert_eq!(Points::from_signed(42).unwrap().value(), 42);
        assert!(matches!(Points::from_signed(-1), Err(StoreError::InvalidInput { .. })));
    }
}
