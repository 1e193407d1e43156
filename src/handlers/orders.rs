use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::order_service::{OrderScope, OrderTracking, StatusUpdate};
use crate::application::Services;
use crate::domain::order::{Order, OrderItemRequest, OrderLine, PlaceOrderRequest, TrackingEntry};
use crate::domain::party::Actor;
use crate::errors::AppError;

use super::addresses::AddressDto;
use super::blocking;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemBody {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Prices and totals are always computed server-side; any sent by the
/// client are ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    /// Omit (or send empty) to check out the caller's cart.
    pub items: Option<Vec<OrderItemBody>>,
    pub delivery_address_id: Option<Uuid>,
    /// `card`, `cash_on_delivery` (default), `paypal` or `wallet`
    pub payment_method: Option<String>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub coupon_code: Option<String>,
}

impl From<PlaceOrderBody> for PlaceOrderRequest {
    fn from(body: PlaceOrderBody) -> Self {
        PlaceOrderRequest {
            items: body.items.map(|items| {
                items
                    .into_iter()
                    .map(|i| OrderItemRequest {
                        product_id: i.product_id,
                        quantity: i.quantity,
                    })
                    .collect()
            }),
            delivery_address_id: body.delivery_address_id,
            payment_method: body.payment_method,
            scheduled_delivery_date: body.scheduled_delivery_date,
            delivery_instructions: body.delivery_instructions,
            coupon_code: body.coupon_code,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    /// `placed`, `processing`, `shipped`, `delivered` or `cancelled`
    pub status: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub weight: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub total_price: String,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(l: OrderLine) -> Self {
        Self {
            total_price: l.total_price().to_string(),
            product_id: l.product_id,
            product_name: l.product_name,
            product_image: l.product_image,
            weight: l.weight,
            quantity: l.quantity,
            unit_price: l.unit_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEntryResponse {
    pub status: String,
    pub message: String,
    pub previous_status: Option<String>,
    pub changed_by: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl From<TrackingEntry> for TrackingEntryResponse {
    fn from(e: TrackingEntry) -> Self {
        Self {
            status: e.status.as_str().to_string(),
            message: e.message,
            previous_status: e.previous_status.map(|s| s.as_str().to_string()),
            changed_by: e.changed_by,
            timestamp: e.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_role: String,
    /// `retail` or `wholesale`
    pub order_type: String,
    pub retailer_id: Option<Uuid>,
    pub wholesaler_id: Option<Uuid>,
    pub items: Vec<OrderLineResponse>,
    pub total_amount: String,
    pub discount_amount: String,
    pub final_amount: String,
    pub payment_method: String,
    pub payment_status: String,
    pub coupon_code: Option<String>,
    pub delivery_address: Option<AddressDto>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub delivery_instructions: Option<String>,
    pub tracking_number: Option<String>,
    pub status: String,
    pub tracking: Vec<TrackingEntryResponse>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            buyer_id: o.buyer_id,
            buyer_role: o.buyer_role.as_str().to_string(),
            order_type: o.kind.as_str().to_string(),
            retailer_id: o.retailer_id,
            wholesaler_id: o.wholesaler_id,
            items: o.lines.into_iter().map(Into::into).collect(),
            total_amount: o.total_amount.to_string(),
            discount_amount: o.discount_amount.to_string(),
            final_amount: o.final_amount.to_string(),
            payment_method: o.payment_method.as_str().to_string(),
            payment_status: o.payment_status.as_str().to_string(),
            coupon_code: o.coupon_code,
            delivery_address: o.delivery_address.map(Into::into),
            scheduled_delivery_date: o.scheduled_delivery_date,
            delivery_instructions: o.delivery_instructions,
            tracking_number: o.tracking_number,
            status: o.status.as_str().to_string(),
            tracking: o.tracking.into_iter().map(Into::into).collect(),
            delivered_at: o.delivered_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub order_id: Uuid,
    pub status: String,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub history: Vec<TrackingEntryResponse>,
}

impl From<OrderTracking> for TrackingResponse {
    fn from(t: OrderTracking) -> Self {
        Self {
            order_id: t.order_id,
            status: t.status.as_str().to_string(),
            tracking_number: t.tracking_number,
            delivered_at: t.delivered_at,
            history: t.history.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// `placed` (orders the caller bought, default) or `received` (orders
    /// where the caller is the seller).
    pub scope: Option<String>,
    /// Only orders currently in this status.
    pub status: Option<String>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "super::default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /v1/orders
///
/// Customer checkout. Stock is reserved atomically for the whole basket
/// before the order is written; on any shortfall nothing is reserved.
#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = PlaceOrderBody,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid request, empty cart or mixed sellers"),
        (status = 403, description = "Caller is not a customer"),
        (status = 404, description = "Unknown product or address"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    services: web::Data<Services>,
    actor: Actor,
    body: web::Json<PlaceOrderBody>,
) -> Result<HttpResponse, AppError> {
    let request = PlaceOrderRequest::from(body.into_inner());
    let order = blocking(move || services.orders.place_order(&actor, request)).await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// POST /v1/orders/wholesale
///
/// Retailer purchase from a single wholesaler. The purchased quantity is
/// credited to the retailer's own proxy products.
#[utoipa::path(
    post,
    path = "/v1/orders/wholesale",
    request_body = PlaceOrderBody,
    responses(
        (status = 201, description = "Wholesale order placed", body = OrderResponse),
        (status = 400, description = "Invalid request or products from several wholesalers"),
        (status = 403, description = "Caller is not a retailer"),
        (status = 409, description = "Insufficient stock"),
        (status = 500, description = "Order placed but proxy stock needs reconciliation"),
    ),
    tag = "orders"
)]
pub async fn place_wholesale_order(
    services: web::Data<Services>,
    actor: Actor,
    body: web::Json<PlaceOrderBody>,
) -> Result<HttpResponse, AppError> {
    let request = PlaceOrderRequest::from(body.into_inner());
    let order = blocking(move || services.orders.place_wholesale_order(&actor, request)).await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /v1/orders
#[utoipa::path(
    get,
    path = "/v1/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown scope or status"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    services: web::Data<Services>,
    actor: Actor,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let scope = match params.scope.as_deref() {
        Some(raw) => raw.parse::<OrderScope>()?,
        None => OrderScope::default(),
    };

    let result = blocking(move || {
        services
            .orders
            .list_orders(&actor, scope, params.status.as_deref(), page, limit)
    })
    .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        total: result.total,
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        page,
        limit,
    }))
}

/// GET /v1/orders/{id}
#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = blocking(move || services.orders.get_order(&actor, order_id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /v1/orders/{id}/status
///
/// Seller-side status change. Cancelling returns the reserved stock.
#[utoipa::path(
    patch,
    path = "/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status or disallowed transition"),
        (status = 403, description = "Caller is not the seller on this order"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusBody>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let update = StatusUpdate {
        status: body.status,
        tracking_number: body.tracking_number,
        notes: body.notes,
    };

    let order = blocking(move || services.orders.update_status(&actor, order_id, update)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /v1/orders/{id}/tracking
#[utoipa::path(
    get,
    path = "/v1/orders/{id}/tracking",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Status and tracking history", body = TrackingResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn track_order(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let tracking = blocking(move || services.orders.track_order(&actor, order_id)).await?;
    Ok(HttpResponse::Ok().json(TrackingResponse::from(tracking)))
}
