use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::party::{Actor, Role};
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, AppError> {
    req.headers()
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {name} header")))?
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("Malformed {name} header")))
}

/// The authenticated caller, as asserted by the gateway in front of us.
impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(actor_from(req))
    }
}

fn actor_from(req: &HttpRequest) -> Result<Actor, AppError> {
    let id = Uuid::parse_str(header(req, USER_ID_HEADER)?.trim())
        .map_err(|_| AppError::Unauthorized(format!("{USER_ID_HEADER} must be a UUID")))?;
    let role: Role = header(req, USER_ROLE_HEADER)?
        .trim()
        .parse()
        .map_err(|_| AppError::Unauthorized(format!("Unknown role in {USER_ROLE_HEADER}")))?;
    Ok(Actor::new(id, role))
}
