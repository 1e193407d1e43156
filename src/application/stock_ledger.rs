use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::{DomainError, StockShortfall};
use crate::domain::party::Owner;
use crate::domain::ports::{ProductRepository, StockRepository};
use crate::domain::product::{Product, StockOperation};

const COMPENSATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Sole mutator of product quantities.
///
/// Batches are checked as a whole before anything is written, then applied
/// one conditional decrement at a time. A decrement that loses a race
/// rolls back the ones already applied in the same batch.
pub struct StockLedger {
    products: Arc<dyn ProductRepository>,
    stock: Arc<dyn StockRepository>,
}

impl StockLedger {
    pub fn new(products: Arc<dyn ProductRepository>, stock: Arc<dyn StockRepository>) -> Self {
        Self { products, stock }
    }

    pub fn reserve(&self, items: &[StockRequest]) -> Result<Vec<Product>, DomainError> {
        validate_quantities(items)?;

        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let current: HashMap<Uuid, Product> = self
            .products
            .find_by_ids(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut shortfalls = Vec::new();
        for item in items {
            let product = current.get(&item.product_id).ok_or_else(|| {
                DomainError::not_found(format!("Product {} not found", item.product_id))
            })?;
            if product.quantity == 0 || product.quantity < item.quantity {
                shortfalls.push(StockShortfall {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    available: product.quantity,
                    requested: item.quantity,
                });
            }
        }
        if !shortfalls.is_empty() {
            return Err(DomainError::Stock(shortfalls));
        }

        let mut applied: Vec<StockRequest> = Vec::with_capacity(items.len());
        let mut reserved = Vec::with_capacity(items.len());
        for item in items {
            match self.stock.decrement_if_available(item.product_id, item.quantity) {
                Ok(Some(product)) => {
                    applied.push(*item);
                    reserved.push(product);
                }
                Ok(None) => {
                    let shortfall = self.shortfall_after_race(item, &current);
                    log::info!(
                        "Reservation lost a race on product {}; rolling back {} item(s)",
                        item.product_id,
                        applied.len()
                    );
                    self.compensate(&applied)?;
                    return Err(DomainError::Stock(vec![shortfall]));
                }
                Err(e) => {
                    log::warn!(
                        "Stock decrement failed for product {}: {}",
                        item.product_id,
                        e
                    );
                    self.compensate(&applied)?;
                    return Err(e);
                }
            }
        }

        log::info!("Reserved stock for {} product(s)", reserved.len());
        Ok(reserved)
    }

    /// Gives reserved stock back. Never reactivates a product.
    pub fn release(&self, items: &[StockRequest]) -> Result<(), DomainError> {
        validate_quantities(items)?;
        self.compensate(items)
    }

    pub fn credit(&self, product_id: Uuid, quantity: i32) -> Result<Product, DomainError> {
        validate_quantities(&[StockRequest {
            product_id,
            quantity,
        }])?;
        self.stock
            .increment(product_id, quantity)?
            .ok_or_else(|| DomainError::not_found(format!("Product {product_id} not found")))
    }

    /// Takes stock away, stopping at zero. Never reactivates a product.
    pub fn withdraw(&self, product_id: Uuid, quantity: i32) -> Result<Product, DomainError> {
        validate_quantities(&[StockRequest {
            product_id,
            quantity,
        }])?;
        self.stock
            .withdraw(product_id, quantity)?
            .ok_or_else(|| DomainError::not_found(format!("Product {product_id} not found")))
    }

    /// Owner restock. This is the only path that reactivates a product.
    pub fn adjust(
        &self,
        owner: Owner,
        product_id: Uuid,
        operation: StockOperation,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        operation.apply(0, quantity)?;
        let product = self
            .products
            .find_by_id(product_id)?
            .filter(|p| p.owner == owner)
            .ok_or_else(|| DomainError::not_found("Product not found"))?;

        let updated = self
            .stock
            .adjust(product.id, operation, quantity)?
            .ok_or_else(|| DomainError::not_found("Product not found"))?;
        log::info!(
            "Stock for product {} adjusted from {} to {}",
            product.id,
            product.quantity,
            updated.quantity
        );
        Ok(updated)
    }

    fn shortfall_after_race(
        &self,
        item: &StockRequest,
        snapshot: &HashMap<Uuid, Product>,
    ) -> StockShortfall {
        let latest = self
            .products
            .find_by_id(item.product_id)
            .ok()
            .flatten()
            .or_else(|| snapshot.get(&item.product_id).cloned());
        StockShortfall {
            product_id: item.product_id,
            product_name: latest
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| item.product_id.to_string()),
            available: latest.map(|p| p.quantity).unwrap_or(0),
            requested: item.quantity,
        }
    }

    /// Re-increments every item, retrying each a few times. Items that still
    /// fail are reported together as a reconciliation failure.
    fn compensate(&self, items: &[StockRequest]) -> Result<(), DomainError> {
        let mut failed = Vec::new();
        for item in items {
            let mut last_error = None;
            for attempt in 1..=COMPENSATION_ATTEMPTS {
                match self.stock.increment(item.product_id, item.quantity) {
                    Ok(Some(_)) => {
                        last_error = None;
                        break;
                    }
                    Ok(None) => {
                        last_error = Some(format!("product {} no longer exists", item.product_id));
                        break;
                    }
                    Err(e) => {
                        log::warn!(
                            "Stock increment for product {} failed (attempt {}/{}): {}",
                            item.product_id,
                            attempt,
                            COMPENSATION_ATTEMPTS,
                            e
                        );
                        last_error = Some(e.to_string());
                    }
                }
            }
            if let Some(reason) = last_error {
                failed.push(format!(
                    "{} x{} ({})",
                    item.product_id, item.quantity, reason
                ));
            }
        }

        if failed.is_empty() {
            return Ok(());
        }
        let detail = failed.join("; ");
        log::error!("Stock drift: could not restore {}", detail);
        Err(DomainError::Reconciliation(format!(
            "could not restore stock for {detail}"
        )))
    }
}

fn validate_quantities(items: &[StockRequest]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::validation("items", "No items to reserve"));
    }
    if let Some((i, _)) = items.iter().enumerate().find(|(_, item)| item.quantity < 1) {
        return Err(DomainError::validation(
            format!("items[{i}].quantity"),
            format!("Item {}: Quantity must be at least 1", i + 1),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::thread;

    use super::*;
    use crate::application::testing::MemoryStore;

    fn ledger(store: &Arc<MemoryStore>) -> StockLedger {
        StockLedger::new(store.clone(), store.clone())
    }

    fn req(product: &Product, quantity: i32) -> StockRequest {
        StockRequest {
            product_id: product.id,
            quantity,
        }
    }

    fn retailer() -> Owner {
        Owner::Retailer(Uuid::new_v4())
    }

    #[test]
    fn reserve_decrements_every_item() {
        let store = MemoryStore::new();
        let owner = retailer();
        let x = store.seed_product(owner, "Rice", 50, 10);
        let y = store.seed_product(owner, "Oil", 30, 4);

        ledger(&store).reserve(&[req(&x, 2), req(&y, 1)]).unwrap();

        assert_eq!(store.product(x.id).quantity, 8);
        assert_eq!(store.product(y.id).quantity, 3);
    }

    #[test]
    fn batch_with_one_shortfall_changes_nothing() {
        let store = MemoryStore::new();
        let owner = retailer();
        let ok = store.seed_product(owner, "Rice", 50, 10);
        let short = store.seed_product(owner, "Oil", 30, 3);
        let empty = store.seed_product(owner, "Salt", 10, 0);

        let err = ledger(&store)
            .reserve(&[req(&ok, 2), req(&short, 5), req(&empty, 1)])
            .unwrap_err();

        let DomainError::Stock(shortfalls) = err else {
            panic!("expected stock error, got {err:?}");
        };
        assert_eq!(shortfalls.len(), 2);
        assert_eq!(
            shortfalls[0],
            StockShortfall {
                product_id: short.id,
                product_name: "Oil".to_string(),
                available: 3,
                requested: 5,
            }
        );
        assert_eq!(shortfalls[1].available, 0);
        assert_eq!(store.product(ok.id).quantity, 10);
        assert_eq!(store.product(short.id).quantity, 3);
        assert_eq!(store.product(empty.id).quantity, 0);
    }

    #[test]
    fn reaching_zero_deactivates_and_release_does_not_reactivate() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Paneer", 90, 2);
        let ledger = ledger(&store);

        ledger.reserve(&[req(&p, 2)]).unwrap();
        let drained = store.product(p.id);
        assert_eq!(drained.quantity, 0);
        assert!(!drained.is_active);

        ledger.release(&[req(&p, 2)]).unwrap();
        let restored = store.product(p.id);
        assert_eq!(restored.quantity, 2);
        assert!(!restored.is_active);
    }

    #[test]
    fn owner_restock_reactivates() {
        let store = MemoryStore::new();
        let owner = retailer();
        let p = store.seed_product(owner, "Curd", 40, 0);

        let updated = ledger(&store)
            .adjust(owner, p.id, StockOperation::Add, 6)
            .unwrap();
        assert_eq!(updated.quantity, 6);
        assert!(updated.is_active);
    }

    #[test]
    fn withdraw_never_reactivates() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Atta", 60, 10);
        ProductRepository::deactivate(store.as_ref(), p.id).unwrap();
        let ledger = ledger(&store);

        let after = ledger.withdraw(p.id, 4).unwrap();
        assert_eq!(after.quantity, 6);
        assert!(!after.is_active);

        let q = store.seed_product(retailer(), "Besan", 70, 5);
        assert!(ledger.withdraw(q.id, 2).unwrap().is_active);
        let drained = ledger.withdraw(q.id, 9).unwrap();
        assert_eq!(drained.quantity, 0);
        assert!(!drained.is_active);
    }

    #[test]
    fn restock_by_non_owner_is_not_found() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Curd", 40, 3);
        let err = ledger(&store)
            .adjust(retailer(), p.id, StockOperation::Set, 10)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(store.product(p.id).quantity, 3);
    }

    #[test]
    fn lost_race_rolls_back_applied_decrements() {
        let store = MemoryStore::new();
        let owner = retailer();
        let first = store.seed_product(owner, "Rice", 50, 10);
        let second = store.seed_product(owner, "Oil", 30, 10);
        *store.lose_decrements_after.lock().unwrap() = Some(1);

        let err = ledger(&store)
            .reserve(&[req(&first, 4), req(&second, 4)])
            .unwrap_err();

        assert!(matches!(err, DomainError::Stock(ref s) if s[0].product_id == second.id));
        assert_eq!(store.product(first.id).quantity, 10);
        assert_eq!(store.product(second.id).quantity, 10);
    }

    #[test]
    fn failed_rollback_surfaces_reconciliation_error() {
        let store = MemoryStore::new();
        let owner = retailer();
        let first = store.seed_product(owner, "Rice", 50, 10);
        let second = store.seed_product(owner, "Oil", 30, 10);
        *store.lose_decrements_after.lock().unwrap() = Some(1);
        store.fail_increments.store(true, Ordering::SeqCst);

        let err = ledger(&store)
            .reserve(&[req(&first, 4), req(&second, 4)])
            .unwrap_err();

        assert!(matches!(err, DomainError::Reconciliation(_)));
        assert_eq!(store.product(first.id).quantity, 6);
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Mango", 100, 10);
        let ledger = Arc::new(ledger(&store));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                let request = req(&p, 6);
                thread::spawn(move || ledger.reserve(&[request]))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(DomainError::Stock(_)))));
        assert_eq!(store.product(p.id).quantity, 4);
    }

    #[test]
    fn quantities_must_be_positive() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Rice", 50, 10);
        assert!(matches!(
            ledger(&store).release(&[req(&p, 0)]),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn stock_never_negative_across_reserve_and_release() {
        let store = MemoryStore::new();
        let p = store.seed_product(retailer(), "Rice", 50, 5);
        let ledger = ledger(&store);

        for qty in [3, 3, 2, 1, 1] {
            let _ = ledger.reserve(&[req(&p, qty)]);
            assert!(store.product(p.id).quantity >= 0);
        }
        ledger.release(&[req(&p, 1)]).unwrap();
        let _ = ledger.withdraw(p.id, 50).unwrap();
        assert_eq!(store.product(p.id).quantity, 0);
    }
}
