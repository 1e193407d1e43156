use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Services;
use crate::domain::commerce::StoredNotification;
use crate::domain::party::Actor;
use crate::errors::AppError;

use super::{blocking, PageParams};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<StoredNotification> for NotificationResponse {
    fn from(n: StoredNotification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            data: n.data,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub items: Vec<NotificationResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// GET /v1/notifications
#[utoipa::path(
    get,
    path = "/v1/notifications",
    params(PageParams),
    responses((status = 200, description = "Caller's notifications, newest first", body = NotificationListResponse)),
    tag = "notifications"
)]
pub async fn list_notifications(
    services: web::Data<Services>,
    actor: Actor,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.window();
    let result =
        blocking(move || services.account.list_notifications(&actor, page, limit)).await?;

    Ok(HttpResponse::Ok().json(NotificationListResponse {
        total: result.total,
        items: result.items.into_iter().map(Into::into).collect(),
        page,
        limit,
    }))
}

/// POST /v1/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification UUID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "No such notification for the caller"),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    services: web::Data<Services>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    blocking(move || services.account.mark_read(&actor, id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
