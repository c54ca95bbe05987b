/// Authentication Routes
///
/// Login, access token refresh, and refresh token revocation.

use actix_web::{web, HttpResponse};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::AuthGateway;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::BearerToken;
use crate::routes::users::UserResponse;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional shorter access token lifetime
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// Login response: the user plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Token refresh response
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// Authenticate user with email and password.
///
/// # Errors
/// - 401: Invalid credentials (email not found or wrong password)
/// - 500/503: Hashing, signing, or storage failure
///
/// # Security Notes
/// - Uses the same error for "not found" and "wrong password"
pub async fn login(
    form: web::Json<LoginRequest>,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let requested_ttl = form.expires_in_seconds.and_then(Duration::try_seconds);

    let outcome = gateway
        .login(&form.email, &form.password, requested_ttl)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %outcome.user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Exchange the refresh token in the Authorization header for a new
/// access token. The refresh token stays valid.
///
/// # Errors
/// - 401: Missing, unknown, expired, or revoked refresh token
pub async fn refresh(
    token: BearerToken,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AppError> {
    let access_token = gateway.refresh(&token.0).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token: access_token }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in the Authorization header. Unknown tokens
/// are treated as already revoked.
///
/// # Errors
/// - 401: Missing Authorization header
/// - 503: Storage failure
pub async fn revoke(
    token: BearerToken,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AppError> {
    match gateway.logout(&token.0).await {
        Ok(()) => {}
        Err(AuthError::RefreshTokenNotFound) => {
            tracing::debug!("Revoke requested for an unknown refresh token");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(HttpResponse::NoContent().finish())
}
