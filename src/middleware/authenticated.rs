/// Bearer token extraction
///
/// Handlers that need an identity take `AuthenticatedUser`, which verifies
/// the access token in the Authorization header before the handler runs.
/// Handlers that need the raw token (refresh, revoke) take `BearerToken`.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::auth::AuthGateway;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// # Errors
/// Returns `MissingToken` if the header is absent, not ASCII, lacks the
/// `Bearer ` prefix, or carries an empty token
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// The raw bearer token of a request
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            bearer_token(req.headers())
                .map(|token| BearerToken(token.to_string()))
                .map_err(AppError::from),
        )
    }
}

/// The user behind a verified access token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let gateway = req
        .app_data::<web::Data<AuthGateway>>()
        .ok_or_else(|| AppError::Internal("auth gateway is not registered".to_string()))?;

    let token = bearer_token(req.headers())?;
    let user_id = gateway.authenticate(token)?;

    tracing::debug!(user_id = %user_id, "Access token validated");
    Ok(AuthenticatedUser { user_id })
}
