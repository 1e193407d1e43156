use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Services;
use crate::domain::commerce::SavedAddress;
use crate::domain::order::DeliveryAddress;
use crate::domain::party::Actor;
use crate::errors::AppError;

use super::blocking;

/// A delivery address as sent and returned over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<DeliveryAddress> for AddressDto {
    fn from(a: DeliveryAddress) -> Self {
        Self {
            label: a.label,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            region: a.region,
            pincode: a.pincode,
            lat: a.lat,
            lng: a.lng,
        }
    }
}

impl From<AddressDto> for DeliveryAddress {
    fn from(a: AddressDto) -> Self {
        Self {
            label: a.label,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            region: a.region,
            pincode: a.pincode,
            lat: a.lat,
            lng: a.lng,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub address: AddressDto,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddressResponse {
    pub id: Uuid,
    pub address: AddressDto,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<SavedAddress> for SavedAddressResponse {
    fn from(a: SavedAddress) -> Self {
        Self {
            id: a.id,
            address: a.address.into(),
            is_default: a.is_default,
            created_at: a.created_at,
        }
    }
}

/// GET /v1/addresses
#[utoipa::path(
    get,
    path = "/v1/addresses",
    responses((status = 200, description = "Saved addresses, default first", body = [SavedAddressResponse])),
    tag = "addresses"
)]
pub async fn list_addresses(
    services: web::Data<Services>,
    actor: Actor,
) -> Result<HttpResponse, AppError> {
    let saved = blocking(move || services.account.list_addresses(&actor)).await?;
    let body: Vec<SavedAddressResponse> = saved.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /v1/addresses
#[utoipa::path(
    post,
    path = "/v1/addresses",
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address saved", body = SavedAddressResponse),
        (status = 400, description = "Missing address field"),
    ),
    tag = "addresses"
)]
pub async fn add_address(
    services: web::Data<Services>,
    actor: Actor,
    body: web::Json<CreateAddressRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let saved = blocking(move || {
        services
            .account
            .add_address(&actor, body.address.into(), body.is_default)
    })
    .await?;
    Ok(HttpResponse::Created().json(SavedAddressResponse::from(saved)))
}
