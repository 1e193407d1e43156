use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::Services;
use crate::domain::product::Product;
use crate::errors::AppError;

use super::blocking;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string, e.g. "49.50"
    pub price: String,
    pub quantity: i32,
    pub is_active: bool,
    pub category: String,
    pub images: Vec<String>,
    pub weight: Option<String>,
    /// `retailer` or `wholesaler`
    pub owner_role: String,
    pub owner_id: Uuid,
    pub source_type: Option<String>,
    pub source_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.to_string(),
            quantity: p.quantity,
            is_active: p.is_active,
            category: p.category,
            images: p.images,
            weight: p.weight,
            owner_role: p.owner.role().as_str().to_string(),
            owner_id: p.owner.id(),
            source_type: p.source_type,
            source_product_id: p.source_product_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsParams {
    /// Only products in this category.
    pub category: Option<String>,
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /v1/products
///
/// Active products across all sellers, newest first.
#[utoipa::path(
    get,
    path = "/v1/products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "Paginated list of products", body = ProductListResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    services: web::Data<Services>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = blocking(move || services.catalog.list_products(params.category, page, limit)).await?;

    Ok(HttpResponse::Ok().json(ProductListResponse {
        total: result.total,
        items: result.items.into_iter().map(ProductResponse::from).collect(),
        page,
        limit,
    }))
}

/// GET /v1/products/{id}
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "products"
)]
pub async fn get_product(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = blocking(move || services.catalog.get_product(id)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
