//! Collaborator records the order workflow reads or writes but does not own:
//! carts, saved addresses and notifications.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::DeliveryAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: DeliveryAddress,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

pub fn validate_address(address: &DeliveryAddress) -> Result<(), DomainError> {
    let required = [
        ("label", &address.label),
        ("line1", &address.line1),
        ("city", &address.city),
        ("region", &address.region),
        ("pincode", &address.pincode),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DomainError::validation(field, format!("{field} is required")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Order,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
        }
    }
}

/// A message handed to the notification sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Short human-facing order reference: the last six hex digits of the id.
pub fn short_ref(order_id: Uuid) -> String {
    let simple = order_id.simple().to_string();
    simple[simple.len() - 6..].to_string()
}
