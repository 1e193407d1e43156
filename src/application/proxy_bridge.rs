use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::party::Owner;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product};

use super::stock_ledger::StockLedger;

/// Gives a retailer a sellable local copy of wholesaler stock it bought.
/// Purely additive on the retailer side.
pub struct ProxyInventoryBridge {
    products: Arc<dyn ProductRepository>,
    ledger: Arc<StockLedger>,
}

impl ProxyInventoryBridge {
    pub fn new(products: Arc<dyn ProductRepository>, ledger: Arc<StockLedger>) -> Self {
        Self { products, ledger }
    }

    pub fn credit_retailer_stock(
        &self,
        retailer_id: Uuid,
        source: &Product,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        if !matches!(source.owner, Owner::Wholesaler(_)) {
            return Err(DomainError::validation(
                "items",
                format!("Product {} is not a wholesaler product", source.id),
            ));
        }
        if quantity < 1 {
            return Err(DomainError::validation("quantity", "Quantity must be at least 1"));
        }

        if let Some(proxy) = self.products.find_proxy(retailer_id, source.id)? {
            return self.ledger.credit(proxy.id, quantity);
        }

        match self
            .products
            .insert_proxy(NewProduct::proxy_of(source, retailer_id, quantity))?
        {
            Some(created) => {
                log::info!(
                    "Created proxy product {} for retailer {} from {}",
                    created.id,
                    retailer_id,
                    source.id
                );
                Ok(created)
            }
            // Another request created the proxy between our lookup and insert.
            None => {
                let proxy = self
                    .products
                    .find_proxy(retailer_id, source.id)?
                    .ok_or_else(|| {
                        DomainError::Internal(format!(
                            "proxy for retailer {retailer_id} and product {} vanished",
                            source.id
                        ))
                    })?;
                self.ledger.credit(proxy.id, quantity)
            }
        }
    }
}
