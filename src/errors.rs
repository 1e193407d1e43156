use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::{DomainError, StockShortfall};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock")]
    Stock(Vec<StockShortfall>),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Reconciliation required: {0}")]
    Reconciliation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { field, message } => AppError::Validation { field, message },
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::Stock(shortfalls) => AppError::Stock(shortfalls),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Reconciliation(msg) => AppError::Reconciliation(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Stock(_) => "stock",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Reconciliation(_) => "reconciliation",
            AppError::Internal(_) => "internal",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Stock(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Reconciliation(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { field, message } => json!({
                "success": false,
                "kind": self.kind(),
                "message": message,
                "errors": [{ "field": field, "message": message }],
            }),
            AppError::Stock(shortfalls) => json!({
                "success": false,
                "kind": self.kind(),
                "message": "Stock validation failed",
                "errors": shortfalls
                    .iter()
                    .map(|s| json!({
                        "field": format!("items[{}]", s.product_id),
                        "message": s.message(),
                    }))
                    .collect::<Vec<_>>(),
                "details": shortfalls,
            }),
            AppError::Reconciliation(detail) => {
                log::error!("Reconciliation required: {}", detail);
                json!({
                    "success": false,
                    "kind": self.kind(),
                    "message": "The order needs manual stock reconciliation",
                    "errors": [],
                })
            }
            AppError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                json!({
                    "success": false,
                    "kind": self.kind(),
                    "message": "Internal server error",
                    "errors": [],
                })
            }
            AppError::NotFound(msg) | AppError::Forbidden(msg) | AppError::Unauthorized(msg) => {
                json!({
                    "success": false,
                    "kind": self.kind(),
                    "message": msg,
                    "errors": [],
                })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use uuid::Uuid;

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Stock(vec![]), StatusCode::CONFLICT),
            (AppError::Reconciliation("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.error_response().status(), status, "{err:?}");
        }
    }

    #[test]
    fn domain_errors_keep_their_kind() {
        let app: AppError = DomainError::validation("items", "Cart is empty").into();
        assert!(matches!(app, AppError::Validation { ref field, .. } if field == "items"));
        let app: AppError = DomainError::Reconciliation("lost".into()).into();
        assert!(matches!(app, AppError::Reconciliation(_)));
    }

    #[actix_web::test]
    async fn validation_body_names_the_field() {
        let body = body_of(AppError::Validation {
            field: "paymentMethod".into(),
            message: "Payment method must be one of: card".into(),
        })
        .await;
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["errors"][0]["field"], "paymentMethod");
    }

    #[actix_web::test]
    async fn stock_body_lists_every_shortfall() {
        let id = Uuid::new_v4();
        let body = body_of(AppError::Stock(vec![StockShortfall {
            product_id: id,
            product_name: "Ghee".into(),
            available: 3,
            requested: 5,
        }]))
        .await;
        assert_eq!(body["kind"], "stock");
        assert_eq!(body["errors"][0]["field"], format!("items[{id}]"));
        assert_eq!(
            body["errors"][0]["message"],
            "Ghee: insufficient stock. Available: 3, Requested: 5"
        );
        assert_eq!(body["details"][0]["available"], 3);
    }

    #[actix_web::test]
    async fn internal_error_hides_detail() {
        let body = body_of(AppError::Internal("password=hunter2".into())).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
