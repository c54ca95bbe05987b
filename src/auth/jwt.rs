/// JWT Token Generation and Validation
///
/// Access tokens are HMAC-signed JWTs. Verification trusts the HMAC family
/// only and grants no clock-skew leeway.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::AuthError;

const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Generate a new access token for a user
///
/// # Arguments
/// * `user_id` - User's UUID, stored as the subject
/// * `secret` - Symmetric signing secret shared with the verifier
/// * `ttl` - Lifetime of the token from now
///
/// # Errors
/// Returns `SigningFailure` if the secret is empty or encoding fails, and
/// `LifetimeOutOfRange` if `ttl` pushes the expiry past what a timestamp holds
pub fn issue_access_token(user_id: &Uuid, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SigningFailure("signing secret is empty".to_string()));
    }

    let claims = Claims::new(*user_id, ttl)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::SigningFailure(e.to_string()))
}

/// Validate an access token and return the user it was issued for
///
/// Checks run in order: structure and algorithm, signature, expiry, issuer,
/// then the subject is parsed as a UUID.
///
/// # Errors
/// * `UnsupportedSigningMethod` - the header names a non-HMAC algorithm
/// * `TokenExpired` - `exp` is in the past
/// * `TokenMalformed` - anything else: bad encoding, bad signature, wrong issuer, bad subject
pub fn verify_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| {
        let err = match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::UnsupportedSigningMethod
            }
            _ => AuthError::TokenMalformed,
        };
        tracing::debug!(error = %e, "JWT validation error");
        err
    })?;

    data.claims.user_id()
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation
}
