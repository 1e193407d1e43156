use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::party::Owner;

pub const SOURCE_TYPE_WHOLESALER: &str = "wholesaler";

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
    pub category: String,
    pub images: Vec<String>,
    pub weight: Option<String>,
    pub owner: Owner,
    pub source_type: Option<String>,
    pub source_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn cover_image(&self) -> Option<String> {
        self.images.first().cloned()
    }
}

/// Fields for a product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub category: String,
    pub images: Vec<String>,
    pub weight: Option<String>,
    pub owner: Owner,
    pub source_type: Option<String>,
    pub source_product_id: Option<Uuid>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_price(&self.price)?;
        if self.quantity < 0 {
            return Err(DomainError::validation(
                "quantity",
                "Stock must be a non-negative integer",
            ));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category", "Category is required"));
        }
        Ok(())
    }

    /// A retailer-owned mirror of a wholesaler product.
    pub fn proxy_of(source: &Product, retailer_id: Uuid, quantity: i32) -> Self {
        Self {
            name: source.name.clone(),
            description: source.description.clone(),
            price: source.price.clone(),
            quantity,
            category: source.category.clone(),
            images: source.images.clone(),
            weight: source.weight.clone(),
            owner: Owner::Retailer(retailer_id),
            source_type: Some(SOURCE_TYPE_WHOLESALER.to_string()),
            source_product_id: Some(source.id),
        }
    }
}

/// A product as submitted by its owner, before ownership is attached.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub category: String,
    pub images: Vec<String>,
    pub weight: Option<String>,
}

impl ProductDraft {
    pub fn owned_by(self, owner: Owner) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            category: self.category,
            images: self.images,
            weight: self.weight,
            owner,
            source_type: None,
            source_product_id: None,
        }
    }
}

/// Owner edits. There is no quantity field: stock moves only through
/// the stock ledger.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub weight: Option<String>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = &self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.weight.is_none()
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().chars().count() < 2 {
        return Err(DomainError::validation(
            "name",
            "Product name must be at least 2 characters",
        ));
    }
    Ok(())
}

fn validate_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::zero() {
        return Err(DomainError::validation(
            "price",
            "Price must be a non-negative number",
        ));
    }
    Ok(())
}

/// Owner-side stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOperation {
    Add,
    Subtract,
    Set,
}

impl StockOperation {
    /// Resulting quantity, clamped at zero for subtraction.
    pub fn apply(&self, current: i32, quantity: i32) -> Result<i32, DomainError> {
        if quantity < 0 {
            return Err(DomainError::validation(
                "quantity",
                "Quantity must be a non-negative integer",
            ));
        }
        let next = match self {
            StockOperation::Add => current.checked_add(quantity).ok_or_else(|| {
                DomainError::validation("quantity", "Quantity exceeds the supported range")
            })?,
            StockOperation::Subtract => (current - quantity).max(0),
            StockOperation::Set => quantity,
        };
        Ok(next)
    }
}

impl FromStr for StockOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(StockOperation::Add),
            "subtract" => Ok(StockOperation::Subtract),
            "set" => Ok(StockOperation::Set),
            _ => Err(DomainError::validation(
                "operation",
                "Operation must be one of: add, subtract, set",
            )),
        }
    }
}
