pub mod account_repo;
pub mod cart_repo;
pub mod models;
pub mod order_repo;
pub mod product_repo;

#[cfg(test)]
pub(crate) mod test_db;

use std::sync::Arc;

use crate::application::Repositories;
use crate::db::DbPool;
use crate::domain::errors::DomainError;

use account_repo::{DieselAddressRepository, DieselNotificationRepository};
use cart_repo::DieselCartRepository;
use order_repo::DieselOrderRepository;
use product_repo::DieselProductRepository;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Postgres-backed implementations of every port, sharing one pool.
pub fn repositories(pool: DbPool) -> Repositories {
    let products = Arc::new(DieselProductRepository::new(pool.clone()));
    Repositories {
        products: products.clone(),
        stock: products,
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        carts: Arc::new(DieselCartRepository::new(pool.clone())),
        addresses: Arc::new(DieselAddressRepository::new(pool.clone())),
        notifications: Arc::new(DieselNotificationRepository::new(pool)),
    }
}

/// Normalizes caller paging to a 1-based page and a 1..=100 limit, and
/// returns the row offset.
pub(crate) fn page_window(page: i64, limit: i64) -> (i64, i64) {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    (limit, (page - 1) * limit)
}
