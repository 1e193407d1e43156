use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Services;
use crate::domain::commerce::CartLine;
use crate::domain::party::Actor;
use crate::errors::AppError;

use super::blocking;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
}

impl From<Vec<CartLine>> for CartResponse {
    fn from(lines: Vec<CartLine>) -> Self {
        Self {
            items: lines
                .into_iter()
                .map(|l| CartLineResponse {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// GET /v1/cart
#[utoipa::path(
    get,
    path = "/v1/cart",
    responses(
        (status = 200, description = "Caller's cart", body = CartResponse),
        (status = 403, description = "Caller is not a customer"),
    ),
    tag = "cart"
)]
pub async fn get_cart(services: web::Data<Services>, actor: Actor) -> Result<HttpResponse, AppError> {
    let lines = blocking(move || services.cart.get_cart(&actor)).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(lines)))
}

/// POST /v1/cart/items
///
/// Adding a product that is already in the cart increases its quantity.
#[utoipa::path(
    post,
    path = "/v1/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Quantity below 1 or above available stock"),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "cart"
)]
pub async fn add_cart_item(
    services: web::Data<Services>,
    actor: Actor,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let lines =
        blocking(move || services.cart.add_item(&actor, body.product_id, body.quantity)).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(lines)))
}

/// PATCH /v1/cart/items/{product_id}
#[utoipa::path(
    patch,
    path = "/v1/cart/items/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product UUID of the cart line")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Quantity below 1 or above available stock"),
        (status = 404, description = "Product or cart line not found"),
    ),
    tag = "cart"
)]
pub async fn update_cart_item(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let lines =
        blocking(move || services.cart.update_item(&actor, product_id, quantity)).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(lines)))
}

/// DELETE /v1/cart/items/{product_id}
#[utoipa::path(
    delete,
    path = "/v1/cart/items/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product UUID of the cart line")),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "cart"
)]
pub async fn remove_cart_item(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let lines = blocking(move || services.cart.remove_item(&actor, product_id)).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(lines)))
}

/// DELETE /v1/cart
#[utoipa::path(
    delete,
    path = "/v1/cart",
    responses((status = 204, description = "Cart cleared")),
    tag = "cart"
)]
pub async fn clear_cart(services: web::Data<Services>, actor: Actor) -> Result<HttpResponse, AppError> {
    blocking(move || services.cart.clear(&actor)).await?;
    Ok(HttpResponse::NoContent().finish())
}
