pub mod account_service;
pub mod cart_service;
pub mod catalog;
pub mod inventory_service;
pub mod order_service;
pub mod proxy_bridge;
pub mod stock_ledger;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use crate::domain::ports::{
    AddressResolver, CartRepository, NotificationSink, OrderRepository, ProductRepository,
    StockRepository,
};

use account_service::AccountService;
use cart_service::CartService;
use catalog::CatalogStore;
use inventory_service::InventoryService;
use order_service::OrderService;
use stock_ledger::StockLedger;

/// Every storage port the services need.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub stock: Arc<dyn StockRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub addresses: Arc<dyn AddressResolver>,
    pub notifications: Arc<dyn NotificationSink>,
}

/// The application layer, wired once at startup and shared by handlers.
pub struct Services {
    pub catalog: Arc<CatalogStore>,
    pub orders: OrderService,
    pub inventory: InventoryService,
    pub cart: CartService,
    pub account: AccountService,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        let catalog = Arc::new(CatalogStore::new(repos.products.clone()));
        let ledger = Arc::new(StockLedger::new(repos.products.clone(), repos.stock.clone()));
        Self {
            orders: OrderService::new(&repos, catalog.clone(), ledger.clone()),
            inventory: InventoryService::new(repos.products.clone(), ledger),
            cart: CartService::new(repos.carts.clone(), catalog.clone()),
            account: AccountService::new(repos.addresses.clone(), repos.notifications.clone()),
            catalog,
        }
    }
}
