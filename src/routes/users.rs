/// User Routes
///
/// Registration and credential changes.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthGateway;
use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::storage::{User, UserStore};
use crate::validators::{is_valid_email, is_valid_password};

/// Registration and credential update request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user
#[derive(Serialize, Debug, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// POST /api/users
///
/// Register a new user with email and password.
///
/// # Errors
/// - 400: Invalid email or password
/// - 409: Email already registered
/// - 500: Hashing or storage failure
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    gateway: web::Data<AuthGateway>,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let hashed_password = gateway.hash_password(&form.password).await?;
    let user = users.create(&email, &hashed_password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// PUT /api/users
///
/// Replace the caller's email and password. Every refresh token of the
/// user is revoked first, so other sessions must log in again.
///
/// # Errors
/// - 400: Invalid email or password
/// - 401: Missing or invalid access token
/// - 404: The token's user no longer exists
/// - 409: Email belongs to another user
/// - 503: Sessions could not be revoked; credentials are unchanged
pub async fn update_user(
    caller: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    gateway: web::Data<AuthGateway>,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(caller.user_id.to_string());

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let hashed_password = gateway.hash_password(&form.password).await?;
    // A failed revoke must leave the credentials untouched.
    let revoked = gateway.revoke_sessions(caller.user_id).await?;
    let user = users
        .update_credentials(caller.user_id, &email, &hashed_password)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        revoked_sessions = revoked,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}
