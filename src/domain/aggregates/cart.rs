//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::loyalty::{apply_discount, DiscountBreakdown, PointsPolicy, TierStanding};
use crate::domain::value_objects::Money;
use crate::{Result, StoreError};

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    customer_id: Option<String>,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Result<Money> { self.unit_price.multiply(self.quantity) }
}

/// What the cart page and checkout show before the order is placed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckoutQuote {
    pub tier: String,
    #[serde(flatten)]
    pub pricing: DiscountBreakdown,
    pub points_to_earn: u64,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(), customer_id: None,
            items: vec![], subtotal: Money::zero(currency), currency: currency.to_string(),
            created_at: now, updated_at: now,
        }
    }

    pub fn for_customer(customer_id: impl Into<String>, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.customer_id = Some(customer_id.into());
        cart
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn customer_id(&self) -> Option<&str> { self.customer_id.as_deref() }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Adds a line, merging into an existing line for the same product.
    pub fn add_item(&mut self, item: CartItem) -> Result<()> {
        if item.quantity == 0 {
            return Err(StoreError::invalid("quantity", "must be at least 1"));
        }
        if item.unit_price.is_negative() {
            return Err(StoreError::invalid("unit_price", "must not be negative"));
        }
        if item.unit_price.currency() != self.currency {
            return Err(StoreError::CurrencyMismatch(self.currency.clone(), item.unit_price.currency().to_string()));
        }
        let previous = self.items.clone();
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        if let Err(err) = self.recalculate() {
            self.items = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or_else(|| not_in_cart(product_id))?;
        if quantity == 0 { self.items.retain(|i| i.product_id != product_id); }
        else { item.quantity = quantity; }
        self.recalculate()
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(not_in_cart(product_id)); }
        self.recalculate()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.subtotal = Money::zero(&self.currency);
        self.updated_at = Utc::now();
    }

    /// Prices the cart for a member at the given standing.
    pub fn quote(&self, standing: &TierStanding, policy: &PointsPolicy) -> Result<CheckoutQuote> {
        let pricing = apply_discount(&self.subtotal, standing.discount_percent())?;
        let points_to_earn = policy.points_for(&pricing.total)?;
        Ok(CheckoutQuote { tier: standing.current_tier.name.clone(), pricing, points_to_earn })
    }

    fn recalculate(&mut self) -> Result<()> {
        self.subtotal = self.items.iter().try_fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()?))?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn not_in_cart(product_id: &str) -> StoreError {
    StoreError::invalid("product_id", format!("{product_id} is not in the cart"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loyalty::{resolve_tier, LoyaltyTier, TierTable};
    use crate::domain::value_objects::DiscountPercent;
    use rust_decimal::Decimal;

    fn book(id: &str, qty: u32, price: i64) -> CartItem {
        CartItem { product_id: id.into(), name: format!("Giao trinh {id}"), quantity: qty, unit_price: Money::vnd(Decimal::new(price, 0)) }
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new("VND");
        cart.add_item(book("P1", 2, 50_000)).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal().amount(), Decimal::new(100_000, 0));
        cart.add_item(book("P1", 1, 50_000)).unwrap();
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        cart.add_item(book("P2", 1, 45_000)).unwrap();
        assert_eq!(cart.subtotal().amount(), Decimal::new(195_000, 0));

        cart.update_quantity("P1", 1).unwrap();
        assert_eq!(cart.subtotal().amount(), Decimal::new(95_000, 0));
        cart.update_quantity("P2", 0).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(cart.remove_item("P2").is_err());
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_rejects_bad_lines() {
        let mut cart = Cart::new("VND");
        assert!(cart.add_item(book("P1", 0, 10)).is_err());
        assert!(cart.add_item(book("P1", 1, -10)).is_err());
        let usd = CartItem { unit_price: Money::new(Decimal::ONE, "USD"), ..book("P1", 1, 1) };
        assert!(matches!(cart.add_item(usd), Err(StoreError::CurrencyMismatch(..))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_overflowing_line_leaves_cart_untouched() {
        let mut cart = Cart::new("VND");
        cart.add_item(book("P1", 1, 10_000)).unwrap();
        let huge = CartItem { unit_price: Money::vnd(Decimal::MAX), ..book("P2", 2, 0) };
        assert!(matches!(cart.add_item(huge), Err(StoreError::InvalidInput { .. })));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal().amount(), Decimal::new(10_000, 0));
    }

    #[test]
    fn test_quote_with_member_discount() {
        let tiers = TierTable::new(vec![
            LoyaltyTier::new("Bronze", 0, DiscountPercent::ZERO),
            LoyaltyTier::new("Silver", 100, DiscountPercent::from_whole(5).unwrap()),
            LoyaltyTier::new("Gold", 500, DiscountPercent::from_whole(10).unwrap()),
        ])
        .unwrap();
        let mut cart = Cart::for_customer("U1", "VND");
        cart.add_item(book("P1", 4, 50_000)).unwrap();

        let quote = cart.quote(&resolve_tier(120, &tiers).unwrap(), &PointsPolicy::default()).unwrap();
        assert_eq!(quote.tier, "Silver");
        assert_eq!(quote.pricing.subtotal.amount(), Decimal::new(200_000, 0));
        assert_eq!(quote.pricing.discount_amount.amount(), Decimal::new(10_000, 0));
        assert_eq!(quote.pricing.total.amount(), Decimal::new(190_000, 0));
        assert_eq!(quote.points_to_earn, 190);
    }
}
