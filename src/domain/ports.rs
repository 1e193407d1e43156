use uuid::Uuid;

use super::commerce::{CartLine, Notification, SavedAddress, StoredNotification};
use super::errors::DomainError;
use super::order::{DeliveryAddress, NewOrder, Order, OrderStatus, StatusChange};
use super::party::{Owner, Role};
use super::product::{NewProduct, Product, ProductPatch, StockOperation};
use super::ListResult;

pub trait ProductRepository: Send + Sync + 'static {
    /// Active products among `ids`. Missing or inactive ids are simply absent.
    fn find_active(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    /// Products among `ids` regardless of their active flag.
    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn find_proxy(&self, retailer_id: Uuid, source_product_id: Uuid)
        -> Result<Option<Product>, DomainError>;
    fn insert(&self, product: NewProduct) -> Result<Product, DomainError>;
    /// Inserts a proxy product unless one already exists for the same
    /// `(retailer, source)` pair, in which case `None` is returned.
    fn insert_proxy(&self, product: NewProduct) -> Result<Option<Product>, DomainError>;
    fn update_details(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError>;
    fn deactivate(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn list_active(
        &self,
        category: Option<String>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError>;
    fn list_by_owner(&self, owner: Owner, page: i64, limit: i64)
        -> Result<ListResult<Product>, DomainError>;
}

/// Quantity mutations. Each call is a single atomic statement in storage.
pub trait StockRepository: Send + Sync + 'static {
    /// Decrements by `quantity` only if at least that much is available,
    /// clearing the active flag when the result is zero. `None` means the
    /// condition did not hold (or the product does not exist).
    fn decrement_if_available(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError>;
    fn increment(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError>;
    /// Subtracts up to `quantity`, stopping at zero. The active flag is
    /// cleared at zero and otherwise left as it was.
    fn withdraw(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError>;
    /// Owner restock. The active flag follows the resulting quantity.
    fn adjust(
        &self,
        id: Uuid,
        operation: StockOperation,
        quantity: i32,
    ) -> Result<Option<Product>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list_by_buyer(
        &self,
        buyer_id: Uuid,
        buyer_role: Role,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError>;
    fn list_by_counterparty(
        &self,
        counterparty: Owner,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError>;
    /// Applies the change only if the order is still in `change.from`.
    /// Returns `None` when the order moved on concurrently.
    fn apply_status_change(&self, change: StatusChange) -> Result<Option<Order>, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn get_cart(&self, customer_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    fn add_item(&self, customer_id: Uuid, line: CartLine) -> Result<Vec<CartLine>, DomainError>;
    /// Replaces the quantity of an existing line. `None` if the product is
    /// not in the cart.
    fn set_quantity(&self, customer_id: Uuid, line: CartLine)
        -> Result<Option<Vec<CartLine>>, DomainError>;
    /// `None` if the product is not in the cart.
    fn remove_item(&self, customer_id: Uuid, product_id: Uuid)
        -> Result<Option<Vec<CartLine>>, DomainError>;
    fn clear(&self, customer_id: Uuid) -> Result<(), DomainError>;
}

pub trait AddressResolver: Send + Sync + 'static {
    fn resolve(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<DeliveryAddress>, DomainError>;
    fn create(
        &self,
        user_id: Uuid,
        address: DeliveryAddress,
        is_default: bool,
    ) -> Result<SavedAddress, DomainError>;
    fn list(&self, user_id: Uuid) -> Result<Vec<SavedAddress>, DomainError>;
}

pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, user_id: Uuid, notification: Notification) -> Result<(), DomainError>;
    fn list(&self, user_id: Uuid, page: i64, limit: i64)
        -> Result<ListResult<StoredNotification>, DomainError>;
    fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DomainError>;
}
