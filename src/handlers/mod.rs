pub mod actor;
pub mod addresses;
pub mod cart;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, OpenApi};

use crate::domain::errors::DomainError;
use crate::errors::AppError;

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Runs a synchronous service call on actix's blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl PageParams {
    pub fn window(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, 100))
    }
}

// ── Routes ───────────────────────────────────────────────────────────────────

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/v1")
            .service(
                web::scope("/products")
                    .route("", web::get().to(products::list_products))
                    .route("/{id}", web::get().to(products::get_product)),
            )
            .service(
                web::scope("/inventory")
                    .route("", web::get().to(inventory::list_inventory))
                    .route("/products", web::post().to(inventory::add_product))
                    .route("/products/{id}", web::patch().to(inventory::update_product))
                    .route("/products/{id}", web::delete().to(inventory::deactivate_product))
                    .route("/products/{id}/stock", web::patch().to(inventory::update_stock)),
            )
            .service(
                web::scope("/cart")
                    .route("", web::get().to(cart::get_cart))
                    .route("", web::delete().to(cart::clear_cart))
                    .route("/items", web::post().to(cart::add_cart_item))
                    .route("/items/{product_id}", web::patch().to(cart::update_cart_item))
                    .route("/items/{product_id}", web::delete().to(cart::remove_cart_item)),
            )
            .service(
                web::scope("/addresses")
                    .route("", web::get().to(addresses::list_addresses))
                    .route("", web::post().to(addresses::add_address)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::place_order))
                    .route("", web::get().to(orders::list_orders))
                    .route("/wholesale", web::post().to(orders::place_wholesale_order))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/status", web::patch().to(orders::update_status))
                    .route("/{id}/tracking", web::get().to(orders::track_order)),
            )
            .service(
                web::scope("/notifications")
                    .route("", web::get().to(notifications::list_notifications))
                    .route("/{id}/read", web::post().to(notifications::mark_read)),
            ),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        products::list_products,
        products::get_product,
        inventory::list_inventory,
        inventory::add_product,
        inventory::update_product,
        inventory::update_stock,
        inventory::deactivate_product,
        cart::get_cart,
        cart::add_cart_item,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::add_address,
        orders::place_order,
        orders::place_wholesale_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::track_order,
        notifications::list_notifications,
        notifications::mark_read,
    ),
    tags(
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "inventory", description = "Retailer and wholesaler product management"),
        (name = "products", description = "Public catalog"),
        (name = "cart", description = "Customer cart"),
        (name = "addresses", description = "Saved delivery addresses"),
        (name = "notifications", description = "In-app notification inbox"),
    )
)]
pub struct ApiDoc;
