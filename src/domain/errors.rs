use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// One line item that could not be reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: Uuid,
    pub product_name: String,
    pub available: i32,
    pub requested: i32,
}

impl StockShortfall {
    pub fn message(&self) -> String {
        if self.available == 0 {
            format!("{} is out of stock", self.product_name)
        } else {
            format!(
                "{}: insufficient stock. Available: {}, Requested: {}",
                self.product_name, self.available, self.requested
            )
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Stock validation failed for {} item(s)", .0.len())]
    Stock(Vec<StockShortfall>),
    #[error("{0}")]
    Forbidden(String),
    #[error("Stock reconciliation failed: {0}")]
    Reconciliation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}
