use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::party::Actor;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{Product, ProductDraft, ProductPatch, StockOperation};
use crate::domain::ListResult;

use super::stock_ledger::StockLedger;

/// Owner-side product management for retailers and wholesalers.
pub struct InventoryService {
    products: Arc<dyn ProductRepository>,
    ledger: Arc<StockLedger>,
}

impl InventoryService {
    pub fn new(products: Arc<dyn ProductRepository>, ledger: Arc<StockLedger>) -> Self {
        Self { products, ledger }
    }

    pub fn add_product(&self, actor: &Actor, draft: ProductDraft) -> Result<Product, DomainError> {
        let owner = actor.require_inventory_manager()?;
        let new_product = draft.owned_by(owner);
        new_product.validate()?;

        let product = self.products.insert(new_product)?;
        log::info!(
            "Product {} added by {} {}",
            product.id,
            owner.role(),
            owner.id()
        );
        Ok(product)
    }

    pub fn update_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, DomainError> {
        let owned = self.owned(actor, product_id)?;
        patch.validate()?;
        if patch.is_empty() {
            return Ok(owned);
        }
        self.products
            .update_details(product_id, patch)?
            .ok_or_else(|| DomainError::not_found("Product not found"))
    }

    pub fn update_stock(
        &self,
        actor: &Actor,
        product_id: Uuid,
        operation: StockOperation,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        let owner = actor.require_inventory_manager()?;
        self.ledger.adjust(owner, product_id, operation, quantity)
    }

    pub fn deactivate_product(&self, actor: &Actor, product_id: Uuid) -> Result<Product, DomainError> {
        self.owned(actor, product_id)?;
        let product = self
            .products
            .deactivate(product_id)?
            .ok_or_else(|| DomainError::not_found("Product not found"))?;
        log::info!("Product {} deactivated by {}", product.id, actor.id);
        Ok(product)
    }

    pub fn list_inventory(
        &self,
        actor: &Actor,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        let owner = actor.require_inventory_manager()?;
        self.products.list_by_owner(owner, page, limit)
    }

    /// Products owned by someone else look missing.
    fn owned(&self, actor: &Actor, product_id: Uuid) -> Result<Product, DomainError> {
        let owner = actor.require_inventory_manager()?;
        self.products
            .find_by_id(product_id)?
            .filter(|p| p.owner == owner)
            .ok_or_else(|| DomainError::not_found("Product not found"))
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::application::testing::MemoryStore;
    use crate::domain::party::Owner;

    fn service(store: &Arc<MemoryStore>) -> InventoryService {
        let ledger = Arc::new(StockLedger::new(store.clone(), store.clone()));
        InventoryService::new(store.clone(), ledger)
    }

    fn draft(name: &str, price: i64, quantity: i32) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: None,
            price: BigDecimal::from(price),
            quantity,
            category: "dairy".to_string(),
            images: vec![],
            weight: Some("500g".to_string()),
        }
    }

    #[test]
    fn customers_cannot_add_products() {
        let store = MemoryStore::new();
        let err = service(&store)
            .add_product(&Actor::customer(Uuid::new_v4()), draft("Paneer", 90, 4))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn added_product_belongs_to_actor() {
        let store = MemoryStore::new();
        let wholesaler = Actor::wholesaler(Uuid::new_v4());
        let product = service(&store)
            .add_product(&wholesaler, draft("Paneer", 90, 4))
            .unwrap();
        assert_eq!(product.owner, Owner::Wholesaler(wholesaler.id));
        assert!(product.is_active);
    }

    #[test]
    fn product_added_without_stock_is_not_listed() {
        let store = MemoryStore::new();
        let product = service(&store)
            .add_product(&Actor::retailer(Uuid::new_v4()), draft("Paneer", 90, 0))
            .unwrap();
        assert!(!product.is_active);
    }

    #[test]
    fn invalid_draft_is_rejected() {
        let store = MemoryStore::new();
        let err = service(&store)
            .add_product(&Actor::retailer(Uuid::new_v4()), draft("Paneer", -5, 4))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "price"));
    }

    #[test]
    fn other_owners_products_look_missing() {
        let store = MemoryStore::new();
        let p = store.seed_product(Owner::Retailer(Uuid::new_v4()), "Curd", 40, 3);
        let svc = service(&store);
        let stranger = Actor::retailer(Uuid::new_v4());

        assert!(matches!(
            svc.update_product(&stranger, p.id, ProductPatch::default()),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_stock(&stranger, p.id, StockOperation::Add, 1),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            svc.deactivate_product(&stranger, p.id),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn patch_updates_price() {
        let store = MemoryStore::new();
        let retailer = Actor::retailer(Uuid::new_v4());
        let p = store.seed_product(Owner::Retailer(retailer.id), "Curd", 40, 3);

        let updated = service(&store)
            .update_product(
                &retailer,
                p.id,
                ProductPatch {
                    price: Some(BigDecimal::from(45)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.price, BigDecimal::from(45));
        assert_eq!(updated.quantity, 3);
    }

    #[test]
    fn set_stock_reactivates() {
        let store = MemoryStore::new();
        let retailer = Actor::retailer(Uuid::new_v4());
        let p = store.seed_product(Owner::Retailer(retailer.id), "Curd", 40, 0);

        let updated = service(&store)
            .update_stock(&retailer, p.id, StockOperation::Set, 7)
            .unwrap();
        assert_eq!(updated.quantity, 7);
        assert!(updated.is_active);
    }

    #[test]
    fn deactivated_product_leaves_listing_but_not_inventory() {
        let store = MemoryStore::new();
        let retailer = Actor::retailer(Uuid::new_v4());
        let p = store.seed_product(Owner::Retailer(retailer.id), "Curd", 40, 3);
        let svc = service(&store);

        let gone = svc.deactivate_product(&retailer, p.id).unwrap();
        assert!(!gone.is_active);
        assert_eq!(svc.list_inventory(&retailer, 1, 20).unwrap().total, 1);
        assert_eq!(store.list_active(None, 1, 20).unwrap().total, 0);
    }
}
