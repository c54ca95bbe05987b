/// Chirp Routes
///
/// Creating (authenticated), listing and fetching chirps, plus the
/// stand-alone body validation endpoint.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::storage::{Chirp, ChirpStore};
use crate::validators::validate_chirp;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Serialize, Debug)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

#[derive(Serialize)]
pub struct CleanedChirpResponse {
    pub cleaned_body: String,
}

/// POST /api/chirps
///
/// # Errors
/// - 400: Body longer than 140 characters
/// - 401: Missing or invalid access token
pub async fn create_chirp(
    author: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_create").with_user_id(author.user_id.to_string());

    let body = validate_chirp(&form.body)?;
    let chirp = chirps.create(author.user_id, &body).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %author.user_id,
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(ChirpResponse::from(chirp)))
}

/// GET /api/chirps
pub async fn list_chirps(chirps: web::Data<dyn ChirpStore>) -> Result<HttpResponse, AppError> {
    let chirps: Vec<ChirpResponse> = chirps
        .list()
        .await?
        .into_iter()
        .map(ChirpResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
///
/// # Errors
/// - 400: The id is not a UUID
/// - 404: No such chirp
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| ValidationError::InvalidFormat("chirp id"))?;

    let chirp = chirps
        .get(chirp_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Chirp not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ChirpResponse::from(chirp)))
}

/// POST /api/validate_chirp
pub async fn check_chirp(form: web::Json<ChirpRequest>) -> Result<HttpResponse, AppError> {
    let cleaned_body = validate_chirp(&form.body)?;

    Ok(HttpResponse::Ok().json(CleanedChirpResponse { cleaned_body }))
}
