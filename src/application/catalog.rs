use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::Product;
use crate::domain::ListResult;

/// Read-only view of sellable products.
pub struct CatalogStore {
    products: Arc<dyn ProductRepository>,
}

impl CatalogStore {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Resolves every id to an active product, in request order, or fails
    /// naming all ids that did not resolve. Never returns a partial result.
    pub fn resolve_items(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut seen = HashSet::new();
        let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let found = self.products.find_active(&unique)?;
        let missing: Vec<String> = unique
            .iter()
            .filter(|id| !found.iter().any(|p| p.id == **id))
            .map(Uuid::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::not_found(format!(
                "Products not found: {}",
                missing.join(", ")
            )));
        }

        let mut ordered = Vec::with_capacity(unique.len());
        for id in unique {
            if let Some(p) = found.iter().find(|p| p.id == id) {
                ordered.push(p.clone());
            }
        }
        Ok(ordered)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("Product not found"))
    }

    pub fn list_products(
        &self,
        category: Option<String>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        self.products.list_active(category, page, limit)
    }
}
