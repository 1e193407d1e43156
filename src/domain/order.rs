use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::party::{Actor, Owner, Role};
use super::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Placed => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Forward-only along placed → processing → shipped → delivered, with
    /// cancellation allowed from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == OrderStatus::Cancelled || next.rank() > self.rank()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                DomainError::validation(
                    "status",
                    format!("Invalid status. Must be one of: {}", allowed.join(", ")),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Retail,
    Wholesale,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Retail => "retail",
            OrderKind::Wholesale => "wholesale",
        }
    }
}

impl FromStr for OrderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retail" => Ok(OrderKind::Retail),
            "wholesale" => Ok(OrderKind::Wholesale),
            other => Err(DomainError::Internal(format!("unknown order kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    #[default]
    CashOnDelivery,
    Paypal,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "paypal" => Ok(PaymentMethod::Paypal),
            "wallet" => Ok(PaymentMethod::Wallet),
            _ => Err(DomainError::validation(
                "paymentMethod",
                "Payment method must be one of: card, cash_on_delivery, paypal, wallet",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::Internal(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// Address snapshot embedded verbatim into an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Frozen copy of a product at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub weight: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderLine {
    pub fn snapshot(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_image: product.cover_image(),
            weight: product.weight.clone(),
            quantity,
            unit_price: product.price.clone(),
        }
    }

    pub fn total_price(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

pub fn total_amount(lines: &[OrderLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::zero(), |acc, line| acc + line.total_price())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingEntry {
    pub status: OrderStatus,
    pub message: String,
    pub previous_status: Option<OrderStatus>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_role: Role,
    pub kind: OrderKind,
    pub retailer_id: Option<Uuid>,
    pub wholesaler_id: Option<Uuid>,
    pub lines: Vec<OrderLine>,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub coupon_code: Option<String>,
    pub delivery_address: Option<DeliveryAddress>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub tracking_number: Option<String>,
    pub status: OrderStatus,
    pub tracking: Vec<TrackingEntry>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The seller side of the order. Wholesale orders always resolve to the
    /// wholesaler even though the retailer id is not stored on them.
    pub fn counterparty(&self) -> Option<Owner> {
        match (self.kind, self.retailer_id, self.wholesaler_id) {
            (OrderKind::Wholesale, _, Some(w)) => Some(Owner::Wholesaler(w)),
            (_, Some(r), _) => Some(Owner::Retailer(r)),
            (_, None, Some(w)) => Some(Owner::Wholesaler(w)),
            _ => None,
        }
    }

    pub fn is_counterparty(&self, actor: &Actor) -> bool {
        matches!(
            (self.counterparty(), actor.as_owner()),
            (Some(seller), Some(owner)) if seller == owner
        )
    }

    pub fn is_buyer(&self, actor: &Actor) -> bool {
        self.buyer_id == actor.id && self.buyer_role == actor.role
    }

    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        self.is_buyer(actor) || self.is_counterparty(actor)
    }
}

/// Everything needed to insert an order. The repository assigns the id and
/// timestamps and writes the initial tracking entry.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: Uuid,
    pub buyer_role: Role,
    pub kind: OrderKind,
    pub counterparty: Owner,
    pub lines: Vec<OrderLine>,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub coupon_code: Option<String>,
    pub delivery_address: Option<DeliveryAddress>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub initial_message: String,
}

/// A status transition to persist together with its tracking entry.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: Uuid,
    pub message: String,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOrderRequest {
    /// `None` or empty means "use my cart".
    pub items: Option<Vec<OrderItemRequest>>,
    pub delivery_address_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub coupon_code: Option<String>,
}

/// Checks per-line quantities and merges repeated products, keeping the
/// order of first appearance.
pub fn normalize_items(items: &[OrderItemRequest]) -> Result<Vec<OrderItemRequest>, DomainError> {
    if items.is_empty() {
        return Err(DomainError::validation(
            "items",
            "Order must contain at least one item",
        ));
    }
    let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        if item.quantity < 1 {
            return Err(DomainError::validation(
                format!("items[{i}].quantity"),
                format!("Item {}: Quantity must be at least 1", i + 1),
            ));
        }
        match index.get(&item.product_id) {
            Some(&pos) => {
                merged[pos].quantity = merged[pos]
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| {
                        DomainError::validation(
                            format!("items[{i}].quantity"),
                            "Quantity exceeds the supported range",
                        )
                    })?;
            }
            None => {
                index.insert(item.product_id, merged.len());
                merged.push(*item);
            }
        }
    }
    Ok(merged)
}

/// The single seller all products belong to. Baskets spanning several
/// owners are rejected.
pub fn derive_counterparty(products: &[Product]) -> Result<Owner, DomainError> {
    let first = products
        .first()
        .ok_or_else(|| DomainError::validation("items", "Order must contain at least one item"))?;
    if products.iter().any(|p| p.owner != first.owner) {
        return Err(DomainError::validation(
            "items",
            "All items in an order must come from a single seller",
        ));
    }
    Ok(first.owner)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn product(owner: Owner, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Atta".to_string(),
            description: None,
            price: BigDecimal::from(price),
            quantity: 10,
            is_active: true,
            category: "flour".to_string(),
            images: vec!["https://img/atta.png".to_string()],
            weight: None,
            owner,
            source_type: None,
            source_product_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_parses_and_rejects() {
        assert_eq!(OrderStatus::from_str("shipped").unwrap(), OrderStatus::Shipped);
        assert!(OrderStatus::from_str("delivery").is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn transitions_move_forward_or_cancel() {
        assert!(OrderStatus::Placed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Placed.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn unknown_payment_method_is_a_validation_error() {
        let err = PaymentMethod::from_str("bitcoin").unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "paymentMethod"));
    }

    #[test]
    fn line_total_is_unit_price_times_quantity() {
        let p = product(Owner::Retailer(Uuid::new_v4()), 50);
        let line = OrderLine::snapshot(&p, 2);
        assert_eq!(line.total_price(), BigDecimal::from(100));
        assert_eq!(line.product_image.as_deref(), Some("https://img/atta.png"));
    }

    #[test]
    fn order_total_sums_lines() {
        let owner = Owner::Retailer(Uuid::new_v4());
        let lines = vec![
            OrderLine::snapshot(&product(owner, 50), 2),
            OrderLine::snapshot(&product(owner, 30), 1),
        ];
        assert_eq!(total_amount(&lines), BigDecimal::from(130));
    }

    #[test]
    fn normalize_merges_duplicate_products() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let items = normalize_items(&[
            OrderItemRequest { product_id: id, quantity: 2 },
            OrderItemRequest { product_id: other, quantity: 1 },
            OrderItemRequest { product_id: id, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], OrderItemRequest { product_id: id, quantity: 5 });
        assert_eq!(items[1].product_id, other);
    }

    #[test]
    fn normalize_rejects_zero_quantity() {
        let err = normalize_items(&[OrderItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 0,
        }])
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "items[0].quantity"));
    }

    #[test]
    fn counterparty_requires_single_owner() {
        let retailer = Owner::Retailer(Uuid::new_v4());
        assert_eq!(
            derive_counterparty(&[product(retailer, 1), product(retailer, 2)]).unwrap(),
            retailer
        );

        let mixed = [product(retailer, 1), product(Owner::Retailer(Uuid::new_v4()), 2)];
        assert!(matches!(
            derive_counterparty(&mixed),
            Err(DomainError::Validation { .. })
        ));
    }
}
