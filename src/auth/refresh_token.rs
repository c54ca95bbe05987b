/// Refresh Token Management
///
/// Refresh tokens are:
/// - Cryptographically secure random 64-character strings
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Reusable until they expire or are revoked (no rotation on refresh)
/// - Revoked lazily: the first lookup past expiry marks them revoked

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AuthError;

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically secure refresh token
///
/// `thread_rng` is a CSPRNG seeded from the OS, so tokens are neither
/// forgeable nor predictable.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh token using SHA-256
///
/// Stores key records by this digest, never by the token itself.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A persisted refresh token, keyed by its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// A live record expiring `ttl` from now
    ///
    /// # Errors
    /// Returns `LifetimeOutOfRange` if `now + ttl` overflows
    pub fn new(user_id: Uuid, ttl: Duration) -> Result<Self, AuthError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::LifetimeOutOfRange)?;

        Ok(Self {
            user_id,
            expires_at,
            revoked_at: None,
        })
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Decide the outcome of a lookup at `now`, revoking in place when the
    /// record has expired. Callers must hold exclusive access to the record.
    pub fn resolve_at(&mut self, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        if self.is_revoked() {
            return Err(AuthError::TokenRevoked);
        }
        if self.is_expired_at(now) {
            self.revoked_at = Some(now);
            return Err(AuthError::TokenExpired);
        }
        Ok(self.user_id)
    }

    /// Mark revoked, keeping the first revocation time
    pub fn revoke_at(&mut self, now: DateTime<Utc>) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(now);
        }
    }
}

/// Storage for opaque refresh tokens
///
/// `resolve` and `revoke` on the same token must be serialized by the
/// implementation: a resolve never succeeds after a revoke has returned.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Create and persist a token for `user_id`, returning its plaintext
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError>;

    /// Map a token back to its user
    ///
    /// # Errors
    /// * `RefreshTokenNotFound` - unknown token
    /// * `TokenRevoked` - revoked earlier, including by a previous expired lookup
    /// * `TokenExpired` - past `expires_at`; the token is revoked as a side effect
    async fn resolve(&self, token: &str) -> Result<Uuid, AuthError>;

    /// Revoke a token. Revoking twice is not an error; an unknown token
    /// yields `RefreshTokenNotFound`.
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;

    /// Revoke every live token of a user, returning how many were revoked
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError>;
}
