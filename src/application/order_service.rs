use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use serde_json::json;
use uuid::Uuid;

use crate::domain::commerce::{short_ref, Notification, NotificationKind};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    derive_counterparty, normalize_items, total_amount, DeliveryAddress, NewOrder, Order,
    OrderItemRequest, OrderKind, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
    PlaceOrderRequest, StatusChange, TrackingEntry,
};
use crate::domain::party::{can_place_retail_order, can_place_wholesale_order, Actor, Owner};
use crate::domain::ports::{
    AddressResolver, CartRepository, NotificationSink, OrderRepository, ProductRepository,
};
use crate::domain::product::Product;
use crate::domain::ListResult;

use super::catalog::CatalogStore;
use super::proxy_bridge::ProxyInventoryBridge;
use super::stock_ledger::{StockLedger, StockRequest};
use super::Repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderScope {
    /// Orders the actor bought.
    #[default]
    Placed,
    /// Orders where the actor is the seller.
    Received,
}

impl FromStr for OrderScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(OrderScope::Placed),
            "received" => Ok(OrderScope::Received),
            _ => Err(DomainError::validation(
                "scope",
                "Scope must be one of: placed, received",
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderTracking {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<chrono::DateTime<chrono::Utc>>,
    pub history: Vec<TrackingEntry>,
}

/// The single checkout algorithm shared by the retail and wholesale paths.
pub struct OrderService {
    catalog: Arc<CatalogStore>,
    ledger: Arc<StockLedger>,
    bridge: ProxyInventoryBridge,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    carts: Arc<dyn CartRepository>,
    addresses: Arc<dyn AddressResolver>,
    notifier: Arc<dyn NotificationSink>,
}

/// Checkout inputs shared by both order kinds once items are resolved.
struct Checkout<'a> {
    buyer: &'a Actor,
    kind: OrderKind,
    counterparty: Owner,
    items: &'a [OrderItemRequest],
    products: &'a [Product],
    payment_method: PaymentMethod,
    delivery_address: Option<DeliveryAddress>,
    request: &'a PlaceOrderRequest,
    initial_message: &'static str,
}

impl OrderService {
    pub fn new(repos: &Repositories, catalog: Arc<CatalogStore>, ledger: Arc<StockLedger>) -> Self {
        Self {
            bridge: ProxyInventoryBridge::new(repos.products.clone(), ledger.clone()),
            catalog,
            ledger,
            products: repos.products.clone(),
            orders: repos.orders.clone(),
            carts: repos.carts.clone(),
            addresses: repos.addresses.clone(),
            notifier: repos.notifications.clone(),
        }
    }

    pub fn place_order(&self, actor: &Actor, request: PlaceOrderRequest) -> Result<Order, DomainError> {
        if !can_place_retail_order(actor.role) {
            return Err(DomainError::forbidden("Only customers can create orders"));
        }
        let payment_method = parse_payment_method(request.payment_method.as_deref())?;

        let explicit = request.items.as_deref().filter(|items| !items.is_empty());
        let from_cart = explicit.is_none();
        let items = match explicit {
            Some(items) => normalize_items(items)?,
            None => {
                let cart = self.carts.get_cart(actor.id)?;
                if cart.is_empty() {
                    return Err(DomainError::validation(
                        "items",
                        "Cart is empty. Cannot create order with empty cart",
                    ));
                }
                let lines: Vec<OrderItemRequest> = cart
                    .iter()
                    .map(|line| OrderItemRequest {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect();
                normalize_items(&lines)?
            }
        };

        let products = self.resolve(&items)?;
        let delivery_address = self.resolve_address(actor, request.delivery_address_id)?;
        let counterparty = derive_counterparty(&products)?;

        let order = self.commit(Checkout {
            buyer: actor,
            kind: OrderKind::Retail,
            counterparty,
            items: &items,
            products: &products,
            payment_method,
            delivery_address,
            request: &request,
            initial_message: "Order placed",
        })?;

        if from_cart {
            if let Err(e) = self.carts.clear(actor.id) {
                log::warn!("Order {} placed but cart of {} was not cleared: {}", order.id, actor.id, e);
            }
        }

        self.notify(
            counterparty.id(),
            Notification {
                kind: NotificationKind::Order,
                title: "New Order".to_string(),
                message: format!("You have a new order #{}", short_ref(order.id)),
                data: json!({ "orderId": order.id }),
            },
        );

        log::info!(
            "Order {} placed by customer {} for {} ({} line(s))",
            order.id,
            actor.id,
            order.final_amount,
            order.lines.len()
        );
        Ok(order)
    }

    pub fn place_wholesale_order(
        &self,
        actor: &Actor,
        request: PlaceOrderRequest,
    ) -> Result<Order, DomainError> {
        if !can_place_wholesale_order(actor.role) {
            return Err(DomainError::forbidden(
                "Only retailers can create wholesale orders",
            ));
        }
        let payment_method = parse_payment_method(request.payment_method.as_deref())?;
        let items = match request.items.as_deref() {
            Some(items) if !items.is_empty() => normalize_items(items)?,
            _ => {
                return Err(DomainError::validation(
                    "items",
                    "Wholesale order must contain at least one item",
                ))
            }
        };

        let products = self.resolve(&items)?;
        if products
            .iter()
            .any(|p| !matches!(p.owner, Owner::Wholesaler(_)))
        {
            return Err(DomainError::validation(
                "items",
                "Products must be sourced from a wholesaler",
            ));
        }
        let wholesaler = derive_counterparty(&products).map_err(|_| {
            DomainError::validation("items", "All products must be from the same wholesaler")
        })?;
        let delivery_address = self.resolve_address(actor, request.delivery_address_id)?;

        let order = self.commit(Checkout {
            buyer: actor,
            kind: OrderKind::Wholesale,
            counterparty: wholesaler,
            items: &items,
            products: &products,
            payment_method,
            delivery_address,
            request: &request,
            initial_message: "Wholesale order placed",
        })?;

        for item in &items {
            let Some(source) = products.iter().find(|p| p.id == item.product_id) else {
                continue;
            };
            if let Err(e) = self
                .bridge
                .credit_retailer_stock(actor.id, source, item.quantity)
            {
                log::error!(
                    "Wholesale order {} placed but retailer {} was not credited {} x{}: {}",
                    order.id,
                    actor.id,
                    source.id,
                    item.quantity,
                    e
                );
                return Err(DomainError::Reconciliation(format!(
                    "order {} was placed but proxy stock for product {} was not credited: {}",
                    order.id, source.id, e
                )));
            }
        }

        self.notify(
            actor.id,
            Notification {
                kind: NotificationKind::Order,
                title: "Wholesale Order Placed".to_string(),
                message: format!(
                    "Your wholesale order #{} has been placed successfully",
                    short_ref(order.id)
                ),
                data: json!({ "orderId": order.id, "type": "wholesale" }),
            },
        );
        self.notify(
            wholesaler.id(),
            Notification {
                kind: NotificationKind::Order,
                title: "New Wholesale Order".to_string(),
                message: format!(
                    "Retailer {} placed a wholesale order #{}",
                    actor.id,
                    short_ref(order.id)
                ),
                data: json!({ "orderId": order.id, "type": "wholesale", "retailerId": actor.id }),
            },
        );

        log::info!(
            "Wholesale order {} placed by retailer {} with wholesaler {}",
            order.id,
            actor.id,
            wholesaler.id()
        );
        Ok(order)
    }

    pub fn update_status(
        &self,
        actor: &Actor,
        order_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Order, DomainError> {
        let next: OrderStatus = update.status.parse()?;
        let order = self
            .orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found("Order not found"))?;

        if !order.is_counterparty(actor) {
            return Err(DomainError::forbidden(
                "Only the seller on this order can update its status",
            ));
        }
        if order.status == next {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(DomainError::validation(
                "status",
                format!("Cannot change status from {} to {}", order.status, next),
            ));
        }

        let change = StatusChange {
            order_id,
            from: order.status,
            to: next,
            changed_by: actor.id,
            message: update
                .notes
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Status changed from {} to {}", order.status, next)),
            tracking_number: update.tracking_number,
            delivered_at: (next == OrderStatus::Delivered).then(chrono::Utc::now),
        };
        let updated = self.orders.apply_status_change(change)?.ok_or_else(|| {
            DomainError::validation(
                "status",
                "Order status changed concurrently; reload and retry",
            )
        })?;

        if next == OrderStatus::Cancelled {
            self.restore_stock(&updated)?;
        }

        self.notify(
            updated.buyer_id,
            Notification {
                kind: NotificationKind::Order,
                title: "Order Status Updated".to_string(),
                message: format!(
                    "Your order #{} status has been updated to {}",
                    short_ref(updated.id),
                    next
                ),
                data: json!({ "orderId": updated.id, "status": next.as_str() }),
            },
        );

        log::info!(
            "Order {} moved from {} to {} by {}",
            updated.id,
            order.status,
            next,
            actor.id
        );
        Ok(updated)
    }

    pub fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(order_id)?
            .filter(|o| o.is_visible_to(actor))
            .ok_or_else(|| DomainError::not_found("Order not found"))
    }

    pub fn track_order(&self, actor: &Actor, order_id: Uuid) -> Result<OrderTracking, DomainError> {
        let order = self.get_order(actor, order_id)?;
        Ok(OrderTracking {
            order_id: order.id,
            status: order.status,
            tracking_number: order.tracking_number,
            delivered_at: order.delivered_at,
            history: order.tracking,
        })
    }

    pub fn list_orders(
        &self,
        actor: &Actor,
        scope: OrderScope,
        status: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        let status = status.map(OrderStatus::from_str).transpose()?;
        match scope {
            OrderScope::Placed => self
                .orders
                .list_by_buyer(actor.id, actor.role, status, page, limit),
            OrderScope::Received => {
                let owner = actor.as_owner().ok_or_else(|| {
                    DomainError::forbidden("Only retailers and wholesalers receive orders")
                })?;
                self.orders.list_by_counterparty(owner, status, page, limit)
            }
        }
    }

    fn resolve(&self, items: &[OrderItemRequest]) -> Result<Vec<Product>, DomainError> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        self.catalog.resolve_items(&ids)
    }

    fn resolve_address(
        &self,
        actor: &Actor,
        address_id: Option<Uuid>,
    ) -> Result<Option<DeliveryAddress>, DomainError> {
        match address_id {
            None => Ok(None),
            Some(id) => self
                .addresses
                .resolve(actor.id, id)?
                .map(Some)
                .ok_or_else(|| DomainError::not_found("Delivery address not found")),
        }
    }

    /// Reserve, snapshot, persist. A failed insert hands the reservation back.
    fn commit(&self, checkout: Checkout<'_>) -> Result<Order, DomainError> {
        let requests: Vec<StockRequest> = checkout
            .items
            .iter()
            .map(|i| StockRequest {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        self.ledger.reserve(&requests)?;

        let by_id: HashMap<Uuid, &Product> = checkout.products.iter().map(|p| (p.id, p)).collect();
        let lines: Vec<OrderLine> = checkout
            .items
            .iter()
            .filter_map(|i| by_id.get(&i.product_id).map(|p| OrderLine::snapshot(p, i.quantity)))
            .collect();
        let total = total_amount(&lines);
        let discount = BigDecimal::zero();
        let final_amount = &total - &discount;

        let new_order = NewOrder {
            buyer_id: checkout.buyer.id,
            buyer_role: checkout.buyer.role,
            kind: checkout.kind,
            counterparty: checkout.counterparty,
            lines,
            total_amount: total,
            discount_amount: discount,
            final_amount,
            payment_method: checkout.payment_method,
            payment_status: PaymentStatus::Pending,
            coupon_code: checkout.request.coupon_code.clone(),
            delivery_address: checkout.delivery_address,
            scheduled_delivery_date: checkout.request.scheduled_delivery_date,
            delivery_instructions: checkout.request.delivery_instructions.clone(),
            initial_message: checkout.initial_message.to_string(),
        };

        match self.orders.create(new_order) {
            Ok(order) => Ok(order),
            Err(e) => {
                log::warn!("Order insert failed, releasing reserved stock: {}", e);
                self.ledger.release(&requests)?;
                Err(e)
            }
        }
    }

    /// Gives back the stock a cancelled order held. Wholesale orders also
    /// take back what was credited to the retailer's proxies.
    fn restore_stock(&self, order: &Order) -> Result<(), DomainError> {
        let requests: Vec<StockRequest> = order
            .lines
            .iter()
            .map(|l| StockRequest {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect();
        self.ledger.release(&requests)?;

        if order.kind != OrderKind::Wholesale {
            return Ok(());
        }
        for line in &order.lines {
            match self.products.find_proxy(order.buyer_id, line.product_id)? {
                Some(proxy) => {
                    if proxy.quantity < line.quantity {
                        log::warn!(
                            "Cancelled wholesale order {}: proxy {} holds {} of {} credited; \
                             the difference stays with the retailer",
                            order.id,
                            proxy.id,
                            proxy.quantity,
                            line.quantity
                        );
                    }
                    self.ledger.withdraw(proxy.id, line.quantity)?;
                }
                None => log::warn!(
                    "Cancelled wholesale order {} has no proxy for product {}",
                    order.id,
                    line.product_id
                ),
            }
        }
        Ok(())
    }

    fn notify(&self, user_id: Uuid, notification: Notification) {
        if let Err(e) = self.notifier.notify(user_id, notification) {
            log::warn!("Failed to notify {}: {}", user_id, e);
        }
    }
}

fn parse_payment_method(raw: Option<&str>) -> Result<PaymentMethod, DomainError> {
    match raw {
        None => Ok(PaymentMethod::default()),
        Some(s) if s.trim().is_empty() => Ok(PaymentMethod::default()),
        Some(s) => s.parse(),
    }
}
