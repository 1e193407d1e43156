//! In-memory port implementations for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::commerce::{CartLine, Notification, SavedAddress, StoredNotification};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    DeliveryAddress, NewOrder, Order, OrderStatus, StatusChange, TrackingEntry,
};
use crate::domain::party::{Owner, Role};
use crate::domain::ports::{
    AddressResolver, CartRepository, NotificationSink, OrderRepository, ProductRepository,
    StockRepository,
};
use crate::domain::product::{NewProduct, Product, ProductPatch, StockOperation};
use crate::domain::ListResult;

use super::Repositories;

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    carts: HashMap<Uuid, Vec<CartLine>>,
    addresses: Vec<SavedAddress>,
    notifications: Vec<StoredNotification>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pub fail_increments: AtomicBool,
    pub fail_order_insert: AtomicBool,
    pub fail_proxy_insert: AtomicBool,
    pub fail_notify: AtomicBool,
    /// Conditional decrements from this call index on report a lost race.
    pub lose_decrements_after: Mutex<Option<usize>>,
    decrement_calls: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            products: self.clone(),
            stock: self.clone(),
            orders: self.clone(),
            carts: self.clone(),
            addresses: self.clone(),
            notifications: self.clone(),
        }
    }

    pub fn seed_product(&self, owner: Owner, name: &str, price: i64, quantity: i32) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(format!("{name} description")),
            price: BigDecimal::from(price),
            quantity,
            is_active: quantity > 0,
            category: "staples".to_string(),
            images: vec![format!("https://img/{name}.png")],
            weight: Some("1kg".to_string()),
            owner,
            source_type: None,
            source_product_id: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product.id, product.clone());
        product
    }

    pub fn product(&self, id: Uuid) -> Product {
        self.state.lock().unwrap().products[&id].clone()
    }

    pub fn set_price(&self, id: Uuid, price: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.products.get_mut(&id) {
            p.price = BigDecimal::from(price);
        }
    }

    pub fn products_owned_by(&self, owner: Owner) -> Vec<Product> {
        self.state
            .lock()
            .unwrap()
            .products
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<StoredNotification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn put_cart(&self, customer_id: Uuid, lines: Vec<CartLine>) {
        self.state.lock().unwrap().carts.insert(customer_id, lines);
    }

    pub fn cart(&self, customer_id: Uuid) -> Vec<CartLine> {
        self.state
            .lock()
            .unwrap()
            .carts
            .get(&customer_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn page<T: Clone>(items: Vec<T>, page: i64, limit: i64) -> ListResult<T> {
    let total = items.len() as i64;
    let offset = ((page - 1) * limit).max(0) as usize;
    ListResult {
        items: items.into_iter().skip(offset).take(limit as usize).collect(),
        total,
    }
}

impl ProductRepository for MemoryStore {
    fn find_active(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.state.lock().unwrap().products.get(&id).cloned())
    }

    fn find_proxy(&self, retailer_id: Uuid, source_product_id: Uuid)
        -> Result<Option<Product>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .products
            .values()
            .find(|p| {
                p.owner == Owner::Retailer(retailer_id)
                    && p.source_product_id == Some(source_product_id)
            })
            .cloned())
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now();
        let row = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            is_active: product.quantity > 0,
            category: product.category,
            images: product.images,
            weight: product.weight,
            owner: product.owner,
            source_type: product.source_type,
            source_product_id: product.source_product_id,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .products
            .insert(row.id, row.clone());
        Ok(row)
    }

    fn insert_proxy(&self, product: NewProduct) -> Result<Option<Product>, DomainError> {
        if self.fail_proxy_insert.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("proxy insert failed".to_string()));
        }
        if let (Owner::Retailer(retailer), Some(source)) = (product.owner, product.source_product_id) {
            if self.find_proxy(retailer, source)?.is_some() {
                return Ok(None);
            }
        }
        self.insert(product).map(Some)
    }

    fn update_details(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(p) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            p.name = name;
        }
        if let Some(description) = patch.description {
            p.description = Some(description);
        }
        if let Some(price) = patch.price {
            p.price = price;
        }
        if let Some(category) = patch.category {
            p.category = category;
        }
        if let Some(images) = patch.images {
            p.images = images;
        }
        if let Some(weight) = patch.weight {
            p.weight = Some(weight);
        }
        p.updated_at = Utc::now();
        Ok(Some(p.clone()))
    }

    fn deactivate(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.products.get_mut(&id).map(|p| {
            p.is_active = false;
            p.clone()
        }))
    }

    fn list_active(&self, category: Option<String>, page_no: i64, limit: i64)
        -> Result<ListResult<Product>, DomainError> {
        let state = self.state.lock().unwrap();
        let items = state
            .products
            .values()
            .filter(|p| p.is_active)
            .filter(|p| category.as_ref().map_or(true, |c| &p.category == c))
            .cloned()
            .collect();
        Ok(page(items, page_no, limit))
    }

    fn list_by_owner(&self, owner: Owner, page_no: i64, limit: i64)
        -> Result<ListResult<Product>, DomainError> {
        Ok(page(self.products_owned_by(owner), page_no, limit))
    }
}

impl StockRepository for MemoryStore {
    fn decrement_if_available(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError> {
        let call = self.decrement_calls.fetch_add(1, Ordering::SeqCst) as usize;
        if let Some(after) = *self.lose_decrements_after.lock().unwrap() {
            if call >= after {
                return Ok(None);
            }
        }
        let mut state = self.state.lock().unwrap();
        let Some(p) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if p.quantity < quantity {
            return Ok(None);
        }
        p.quantity -= quantity;
        if p.quantity == 0 {
            p.is_active = false;
        }
        Ok(Some(p.clone()))
    }

    fn increment(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("connection reset".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        Ok(state.products.get_mut(&id).map(|p| {
            p.quantity += quantity;
            p.clone()
        }))
    }

    fn withdraw(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.products.get_mut(&id).map(|p| {
            p.quantity = (p.quantity - quantity).max(0);
            if p.quantity == 0 {
                p.is_active = false;
            }
            p.clone()
        }))
    }

    fn adjust(&self, id: Uuid, operation: StockOperation, quantity: i32)
        -> Result<Option<Product>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(p) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        p.quantity = operation.apply(p.quantity, quantity)?;
        p.is_active = p.quantity > 0;
        Ok(Some(p.clone()))
    }
}

impl OrderRepository for MemoryStore {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        if self.fail_order_insert.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("insert failed".to_string()));
        }
        let now = Utc::now();
        let (retailer_id, wholesaler_id) = match order.counterparty {
            Owner::Retailer(id) => (Some(id), None),
            Owner::Wholesaler(id) => (None, Some(id)),
        };
        let row = Order {
            id: Uuid::new_v4(),
            buyer_id: order.buyer_id,
            buyer_role: order.buyer_role,
            kind: order.kind,
            retailer_id,
            wholesaler_id,
            lines: order.lines,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            final_amount: order.final_amount,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            coupon_code: order.coupon_code,
            delivery_address: order.delivery_address,
            scheduled_delivery_date: order.scheduled_delivery_date,
            delivery_instructions: order.delivery_instructions,
            tracking_number: None,
            status: OrderStatus::Placed,
            tracking: vec![TrackingEntry {
                status: OrderStatus::Placed,
                message: order.initial_message,
                previous_status: None,
                changed_by: None,
                created_at: now,
            }],
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().orders.insert(row.id, row.clone());
        Ok(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.state.lock().unwrap().orders.get(&id).cloned())
    }

    fn list_by_buyer(
        &self,
        buyer_id: Uuid,
        buyer_role: Role,
        status: Option<OrderStatus>,
        page_no: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        let state = self.state.lock().unwrap();
        let items = state
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id && o.buyer_role == buyer_role)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(page(items, page_no, limit))
    }

    fn list_by_counterparty(
        &self,
        counterparty: Owner,
        status: Option<OrderStatus>,
        page_no: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        let state = self.state.lock().unwrap();
        let items = state
            .orders
            .values()
            .filter(|o| o.counterparty() == Some(counterparty))
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(page(items, page_no, limit))
    }

    fn apply_status_change(&self, change: StatusChange) -> Result<Option<Order>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(order) = state.orders.get_mut(&change.order_id) else {
            return Ok(None);
        };
        if order.status != change.from {
            return Ok(None);
        }
        let now = Utc::now();
        order.status = change.to;
        if change.tracking_number.is_some() {
            order.tracking_number = change.tracking_number;
        }
        if change.delivered_at.is_some() {
            order.delivered_at = change.delivered_at;
        }
        order.updated_at = now;
        order.tracking.push(TrackingEntry {
            status: change.to,
            message: change.message,
            previous_status: Some(change.from),
            changed_by: Some(change.changed_by),
            created_at: now,
        });
        Ok(Some(order.clone()))
    }
}

impl CartRepository for MemoryStore {
    fn get_cart(&self, customer_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        Ok(self.cart(customer_id))
    }

    fn add_item(&self, customer_id: Uuid, line: CartLine) -> Result<Vec<CartLine>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let cart = state.carts.entry(customer_id).or_default();
        match cart.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => cart.push(line),
        }
        Ok(cart.clone())
    }

    fn set_quantity(&self, customer_id: Uuid, line: CartLine)
        -> Result<Option<Vec<CartLine>>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(cart) = state.carts.get_mut(&customer_id) else {
            return Ok(None);
        };
        match cart.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = line.quantity;
                Ok(Some(cart.clone()))
            }
            None => Ok(None),
        }
    }

    fn remove_item(&self, customer_id: Uuid, product_id: Uuid)
        -> Result<Option<Vec<CartLine>>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(cart) = state.carts.get_mut(&customer_id) else {
            return Ok(None);
        };
        let before = cart.len();
        cart.retain(|l| l.product_id != product_id);
        if cart.len() == before {
            return Ok(None);
        }
        Ok(Some(cart.clone()))
    }

    fn clear(&self, customer_id: Uuid) -> Result<(), DomainError> {
        self.state.lock().unwrap().carts.remove(&customer_id);
        Ok(())
    }
}

impl AddressResolver for MemoryStore {
    fn resolve(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<DeliveryAddress>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .addresses
            .iter()
            .find(|a| a.id == address_id && a.user_id == user_id)
            .map(|a| a.address.clone()))
    }

    fn create(&self, user_id: Uuid, address: DeliveryAddress, is_default: bool)
        -> Result<SavedAddress, DomainError> {
        let mut state = self.state.lock().unwrap();
        if is_default {
            for a in state.addresses.iter_mut().filter(|a| a.user_id == user_id) {
                a.is_default = false;
            }
        }
        let saved = SavedAddress {
            id: Uuid::new_v4(),
            user_id,
            address,
            is_default,
            created_at: Utc::now(),
        };
        state.addresses.push(saved.clone());
        Ok(saved)
    }

    fn list(&self, user_id: Uuid) -> Result<Vec<SavedAddress>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl NotificationSink for MemoryStore {
    fn notify(&self, user_id: Uuid, notification: Notification) -> Result<(), DomainError> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("notification store down".to_string()));
        }
        self.state.lock().unwrap().notifications.push(StoredNotification {
            id: Uuid::new_v4(),
            user_id,
            kind: notification.kind.as_str().to_string(),
            title: notification.title,
            message: notification.message,
            data: notification.data,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn list(&self, user_id: Uuid, page_no: i64, limit: i64)
        -> Result<ListResult<StoredNotification>, DomainError> {
        Ok(page(self.notifications_for(user_id), page_no, limit))
    }

    fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
