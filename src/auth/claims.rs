/// JWT Claims structure
///
/// Registered claims only (RFC 7519): the subject is the user id.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Issuer stamped into every access token
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `user_id` expiring `ttl` from now
    ///
    /// # Errors
    /// Returns `LifetimeOutOfRange` if `now + ttl` overflows
    pub fn new(user_id: Uuid, ttl: Duration) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or(AuthError::LifetimeOutOfRange)?;

        Ok(Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        })
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenMalformed` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenMalformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1)).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1)).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1)).unwrap();
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn test_unrepresentable_expiry_is_rejected() {
        let result = Claims::new(Uuid::new_v4(), Duration::max_value());
        assert_eq!(result, Err(AuthError::LifetimeOutOfRange));
    }
}
