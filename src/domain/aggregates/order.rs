//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::cart::Cart;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::lifecycle::{self, Actor, OrderAction, OrderSnapshot, OrderStatus, PaymentMethod};
use crate::domain::loyalty::{apply_discount, DiscountBreakdown, PointsPolicy, TierStanding};
use crate::domain::value_objects::Money;
use crate::{Result, StoreError};

#[derive(Clone, Debug)]
pub struct Order {
    id: String,
    customer_id: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    items: Vec<LineItem>,
    pricing: DiscountBreakdown,
    points_earned: u64,
    shipping: ShippingInfo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineItem { pub product_id: String, pub name: String, pub quantity: u32, pub unit_price: Money, pub total: Money }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo { pub name: String, pub phone: String, pub address: String, pub note: Option<String> }

impl Order {
    /// Turns a customer's cart into a pending order priced at the member's
    /// current tier.
    pub fn place(
        cart: &Cart,
        standing: &TierStanding,
        policy: &PointsPolicy,
        payment_method: PaymentMethod,
        shipping: ShippingInfo,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if cart.is_empty() { return Err(StoreError::invalid("items", "cart is empty")); }
        let customer_id = cart.customer_id().ok_or_else(|| StoreError::invalid("customer_id", "cart has no owner"))?;
        if shipping.name.trim().is_empty() || shipping.phone.trim().is_empty() || shipping.address.trim().is_empty() {
            return Err(StoreError::invalid("shipping_info", "name, phone and address are required"));
        }

        let items = cart.items().iter().map(|i| -> Result<LineItem> {
            Ok(LineItem {
                product_id: i.product_id.clone(), name: i.name.clone(), quantity: i.quantity,
                unit_price: i.unit_price.clone(), total: i.line_total()?,
            })
        }).collect::<Result<Vec<_>>>()?;
        let pricing = apply_discount(cart.subtotal(), standing.discount_percent())?;
        let points_earned = policy.points_for(&pricing.total)?;

        let mut order = Self {
            id: Uuid::now_v7().to_string(), customer_id: customer_id.to_string(), status: OrderStatus::Pending,
            payment_method, items, pricing, points_earned, shipping, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(OrderEvent::Placed {
            order_id: order.id.clone(), customer_id: order.customer_id.clone(), points_pending: points_earned,
        });
        Ok(order)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn pricing(&self) -> &DiscountBreakdown { &self.pricing }
    pub fn total(&self) -> &Money { &self.pricing.total }
    pub fn points_earned(&self) -> u64 { self.points_earned }
    pub fn shipping(&self) -> &ShippingInfo { &self.shipping }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot { status: self.status, created_at: self.created_at, payment_method: self.payment_method }
    }

    pub fn permitted_actions(&self, actor: Actor, now: DateTime<Utc>) -> Vec<OrderAction> {
        lifecycle::permitted_actions(&self.snapshot(), actor, now)
    }

    pub fn can_cancel(&self) -> bool { lifecycle::can_cancel(self.status) }
    pub fn can_return(&self, now: DateTime<Utc>) -> bool { self.snapshot().can_return(now) }

    /// Runs the guard, then moves the order and records the matching event.
    pub fn apply(&mut self, action: OrderAction, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> {
        let next = lifecycle::transition(&self.snapshot(), action, actor, now)?;
        self.status = next;
        self.updated_at = now;

        let order_id = self.id.clone();
        let event = match action {
            OrderAction::Cancel => OrderEvent::Cancelled {
                order_id,
                restock: self.items.iter().map(|i| (i.product_id.clone(), i.quantity)).collect(),
            },
            OrderAction::MarkShipping => OrderEvent::Shipped { order_id },
            OrderAction::Receive => OrderEvent::Completed {
                order_id, customer_id: self.customer_id.clone(), points_awarded: self.points_earned,
            },
            OrderAction::Return => OrderEvent::Returned {
                order_id, customer_id: self.customer_id.clone(), points_revoked: self.points_earned,
            },
        };
        tracing::debug!(order_id = %self.id, %action, status = %next, "order transition applied");
        self.raise_event(event);
        Ok(next)
    }

    pub fn cancel(&mut self, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> { self.apply(OrderAction::Cancel, actor, now) }
    pub fn mark_shipping(&mut self, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> { self.apply(OrderAction::MarkShipping, actor, now) }
    pub fn receive(&mut self, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> { self.apply(OrderAction::Receive, actor, now) }
    pub fn request_return(&mut self, actor: Actor, now: DateTime<Utc>) -> Result<OrderStatus> { self.apply(OrderAction::Return, actor, now) }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::cart::CartItem;
    use crate::domain::loyalty::{resolve_tier, TierTable};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 10, 1, 9, 30, 0).unwrap() }

    fn shipping() -> ShippingInfo {
        ShippingInfo { name: "Nguyen Van A".into(), phone: "0900000000".into(), address: "KTX khu A".into(), note: None }
    }

    fn order(payment: PaymentMethod) -> Order {
        let mut cart = Cart::for_customer("U1", "VND");
        cart.add_item(CartItem { product_id: "B1".into(), name: "Giai tich 1".into(), quantity: 2, unit_price: Money::vnd(Decimal::new(60_000, 0)) }).unwrap();
        let standing = resolve_tier(1_200, &TierTable::standard()).unwrap();
        Order::place(&cart, &standing, &PointsPolicy::default(), payment, shipping(), t0()).unwrap()
    }

    #[test]
    fn test_place_prices_with_tier() {
        let mut o = order(PaymentMethod::Cod);
        assert_eq!(o.status(), OrderStatus::Pending);
        // Silver: 2% off 120,000
        assert_eq!(o.pricing().discount_amount.amount(), Decimal::new(2_400, 0));
        assert_eq!(o.total().amount(), Decimal::new(117_600, 0));
        assert_eq!(o.points_earned(), 117);
        assert!(matches!(o.take_events().as_slice(), [DomainEvent::Order(OrderEvent::Placed { points_pending: 117, .. })]));
    }

    #[test]
    fn test_place_requires_items_and_address() {
        let standing = resolve_tier(0, &TierTable::standard()).unwrap();
        let empty = Cart::for_customer("U1", "VND");
        assert!(Order::place(&empty, &standing, &PointsPolicy::default(), PaymentMethod::Cod, shipping(), t0()).is_err());

        let mut cart = Cart::for_customer("U1", "VND");
        cart.add_item(CartItem { product_id: "B1".into(), name: "x".into(), quantity: 1, unit_price: Money::vnd(Decimal::ONE) }).unwrap();
        let blank = ShippingInfo { address: " ".into(), ..shipping() };
        assert!(Order::place(&cart, &standing, &PointsPolicy::default(), PaymentMethod::Cod, blank, t0()).is_err());
    }

    #[test]
    fn test_place_takes_customer_from_cart() {
        let standing = resolve_tier(0, &TierTable::standard()).unwrap();
        let mut anonymous = Cart::new("VND");
        anonymous.add_item(CartItem { product_id: "B1".into(), name: "x".into(), quantity: 1, unit_price: Money::vnd(Decimal::ONE) }).unwrap();
        let err = Order::place(&anonymous, &standing, &PointsPolicy::default(), PaymentMethod::Cod, shipping(), t0()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { ref field, .. } if field == "customer_id"));

        let o = order(PaymentMethod::Cod);
        assert_eq!(o.customer_id(), "U1");
    }

    #[test]
    fn test_order_workflow() {
        let mut o = order(PaymentMethod::BankTransfer);
        o.take_events();
        o.mark_shipping(Actor::Admin, t0() + Duration::hours(4)).unwrap();
        o.receive(Actor::Customer, t0() + Duration::days(2)).unwrap();
        assert_eq!(o.status(), OrderStatus::Completed);
        o.request_return(Actor::Customer, t0() + Duration::days(6)).unwrap();
        assert_eq!(o.status(), OrderStatus::Returned);

        let events = o.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], DomainEvent::Order(OrderEvent::Completed { points_awarded: 117, .. })));
        assert!(matches!(&events[2], DomainEvent::Order(OrderEvent::Returned { points_revoked: 117, .. })));
        assert!(o.permitted_actions(Actor::Admin, t0() + Duration::days(6)).is_empty());
    }

    #[test]
    fn test_cancel_restocks_and_is_terminal() {
        let mut o = order(PaymentMethod::Cod);
        o.take_events();
        o.cancel(Actor::Customer, t0() + Duration::hours(1)).unwrap();
        assert_eq!(
            o.take_events(),
            vec![DomainEvent::Order(OrderEvent::Cancelled { order_id: o.id().to_string(), restock: vec![("B1".into(), 2)] })]
        );
        assert!(o.cancel(Actor::Admin, t0() + Duration::hours(2)).is_err());
        assert!(o.take_events().is_empty());
    }

    #[test]
    fn test_late_return_rejected() {
        let mut o = order(PaymentMethod::Cod);
        o.mark_shipping(Actor::Admin, t0()).unwrap();
        assert!(o.receive(Actor::Customer, t0() + Duration::days(1)).is_err());
        o.receive(Actor::Admin, t0() + Duration::days(1)).unwrap();
        let err = o.request_return(Actor::Customer, t0() + Duration::days(7) + Duration::hours(1)).unwrap_err();
        assert_eq!(err, StoreError::TransitionNotAllowed { status: "completed".into(), action: "return".into() });
        assert_eq!(o.status(), OrderStatus::Completed);
    }
}
