use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::commerce::{CartLine, SavedAddress, StoredNotification};
use crate::domain::errors::DomainError;
use crate::domain::order::{DeliveryAddress, Order, OrderLine, TrackingEntry};
use crate::domain::party::Owner;
use crate::domain::product::{NewProduct, Product};
use crate::schema::{
    addresses, cart_items, notifications, order_lines, order_tracking, orders, products,
};

fn corrupt(what: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(format!("stored {what} is unreadable: {e}"))
}

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
    pub category: String,
    pub images: Value,
    pub weight: Option<String>,
    pub owner_role: String,
    pub owner_id: Uuid,
    pub source_type: Option<String>,
    pub source_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            is_active: row.is_active,
            category: row.category,
            images: serde_json::from_value(row.images).map_err(|e| corrupt("images", e))?,
            weight: row.weight,
            owner: Owner::from_parts(&row.owner_role, row.owner_id)
                .map_err(|e| corrupt("owner", e))?,
            source_type: row.source_type,
            source_product_id: row.source_product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
    pub category: String,
    pub images: Value,
    pub weight: Option<String>,
    pub owner_role: String,
    pub owner_id: Uuid,
    pub source_type: Option<String>,
    pub source_product_id: Option<Uuid>,
}

impl From<NewProduct> for NewProductRow {
    fn from(p: NewProduct) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: p.name,
            description: p.description,
            price: p.price,
            is_active: p.quantity > 0,
            quantity: p.quantity,
            category: p.category,
            images: Value::from(p.images),
            weight: p.weight,
            owner_role: p.owner.role().as_str().to_string(),
            owner_id: p.owner.id(),
            source_type: p.source_type,
            source_product_id: p.source_product_id,
        }
    }
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub images: Option<Value>,
    pub weight: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_role: String,
    pub kind: String,
    pub retailer_id: Option<Uuid>,
    pub wholesaler_id: Option<Uuid>,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub payment_method: String,
    pub payment_status: String,
    pub coupon_code: Option<String>,
    pub delivery_address: Option<Value>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub tracking_number: Option<String>,
    pub status: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Assembles the aggregate. `lines` and `tracking` must already be in
    /// position and insertion order.
    pub fn into_domain(
        self,
        lines: Vec<OrderLineRow>,
        tracking: Vec<TrackingRow>,
    ) -> Result<Order, DomainError> {
        let delivery_address = self
            .delivery_address
            .map(serde_json::from_value::<DeliveryAddress>)
            .transpose()
            .map_err(|e| corrupt("delivery address", e))?;

        Ok(Order {
            id: self.id,
            buyer_id: self.buyer_id,
            buyer_role: self.buyer_role.parse().map_err(|e| corrupt("buyer role", e))?,
            kind: self.kind.parse()?,
            retailer_id: self.retailer_id,
            wholesaler_id: self.wholesaler_id,
            lines: lines.into_iter().map(OrderLine::from).collect(),
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
            final_amount: self.final_amount,
            payment_method: self
                .payment_method
                .parse()
                .map_err(|e| corrupt("payment method", e))?,
            payment_status: self.payment_status.parse()?,
            coupon_code: self.coupon_code,
            delivery_address,
            scheduled_delivery_date: self.scheduled_delivery_date,
            delivery_instructions: self.delivery_instructions,
            tracking_number: self.tracking_number,
            status: self.status.parse().map_err(|e| corrupt("status", e))?,
            tracking: tracking
                .into_iter()
                .map(TrackingEntry::try_from)
                .collect::<Result<_, _>>()?,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_role: String,
    pub kind: String,
    pub retailer_id: Option<Uuid>,
    pub wholesaler_id: Option<Uuid>,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub payment_method: String,
    pub payment_status: String,
    pub coupon_code: Option<String>,
    pub delivery_address: Option<Value>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub status: String,
}

/// `None` fields are left untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderStatusChangeset {
    pub status: String,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub weight: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            weight: row.weight,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub weight: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_tracking)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TrackingRow {
    pub id: i64,
    pub order_id: Uuid,
    pub status: String,
    pub message: String,
    pub previous_status: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for TrackingEntry {
    type Error = DomainError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        Ok(TrackingEntry {
            status: row.status.parse().map_err(|e| corrupt("tracking status", e))?,
            message: row.message,
            previous_status: row
                .previous_status
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| corrupt("tracking status", e))?,
            changed_by: row.changed_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_tracking)]
pub struct NewTrackingRow {
    pub order_id: Uuid,
    pub status: String,
    pub message: String,
    pub previous_status: Option<String>,
    pub changed_by: Option<Uuid>,
}

// ── Carts, addresses, notifications ──────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartItemRow> for CartLine {
    fn from(row: CartItemRow) -> Self {
        CartLine {
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl AddressRow {
    pub fn address(&self) -> DeliveryAddress {
        DeliveryAddress {
            label: self.label.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            pincode: self.pincode.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

impl From<AddressRow> for SavedAddress {
    fn from(row: AddressRow) -> Self {
        SavedAddress {
            id: row.id,
            user_id: row.user_id,
            address: row.address(),
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_default: bool,
}

impl NewAddressRow {
    pub fn new(user_id: Uuid, address: DeliveryAddress, is_default: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            label: address.label,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            region: address.region,
            pincode: address.pincode,
            lat: address.lat,
            lng: address.lng,
            is_default,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for StoredNotification {
    fn from(row: NotificationRow) -> Self {
        StoredNotification {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            data: row.data,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Value,
}
