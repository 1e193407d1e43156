use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Services;
use crate::domain::errors::DomainError;
use crate::domain::party::Actor;
use crate::domain::product::{ProductDraft, ProductPatch, StockOperation};
use crate::errors::AppError;

use super::products::{ProductListResponse, ProductResponse};
use super::{blocking, PageParams};

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    #[serde(default)]
    pub quantity: i32,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub weight: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub weight: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStockRequest {
    /// `add`, `subtract` or `set`
    pub operation: String,
    pub quantity: i32,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim()).map_err(|_| {
        DomainError::validation("price", format!("Invalid price '{raw}'")).into()
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /v1/inventory
///
/// The caller's own products, including inactive ones.
#[utoipa::path(
    get,
    path = "/v1/inventory",
    params(PageParams),
    responses(
        (status = 200, description = "Caller's products", body = ProductListResponse),
        (status = 403, description = "Caller is not a retailer or wholesaler"),
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    services: web::Data<Services>,
    actor: Actor,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.window();
    let result = blocking(move || services.inventory.list_inventory(&actor, page, limit)).await?;

    Ok(HttpResponse::Ok().json(ProductListResponse {
        total: result.total,
        items: result.items.into_iter().map(ProductResponse::from).collect(),
        page,
        limit,
    }))
}

/// POST /v1/inventory/products
#[utoipa::path(
    post,
    path = "/v1/inventory/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Caller is not a retailer or wholesaler"),
    ),
    tag = "inventory"
)]
pub async fn add_product(
    services: web::Data<Services>,
    actor: Actor,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let draft = ProductDraft {
        price: parse_price(&body.price)?,
        name: body.name,
        description: body.description,
        quantity: body.quantity,
        category: body.category,
        images: body.images,
        weight: body.weight,
    };

    let product = blocking(move || services.inventory.add_product(&actor, draft)).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PATCH /v1/inventory/products/{id}
///
/// Price changes never touch orders already placed.
#[utoipa::path(
    patch,
    path = "/v1/inventory/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "inventory"
)]
pub async fn update_product(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let patch = ProductPatch {
        price: body.price.as_deref().map(parse_price).transpose()?,
        name: body.name,
        description: body.description,
        category: body.category,
        images: body.images,
        weight: body.weight,
    };

    let product = blocking(move || services.inventory.update_product(&actor, id, patch)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PATCH /v1/inventory/products/{id}/stock
#[utoipa::path(
    patch,
    path = "/v1/inventory/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = ProductResponse),
        (status = 400, description = "Unknown operation or negative quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "inventory"
)]
pub async fn update_stock(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStockRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let operation = StockOperation::from_str(&body.operation)?;

    let product = blocking(move || {
        services
            .inventory
            .update_stock(&actor, id, operation, body.quantity)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /v1/inventory/products/{id}
///
/// Soft delete: the product is deactivated, never removed.
#[utoipa::path(
    delete,
    path = "/v1/inventory/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product deactivated", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "inventory"
)]
pub async fn deactivate_product(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = blocking(move || services.inventory.deactivate_product(&actor, id)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
