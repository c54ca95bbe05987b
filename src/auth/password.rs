/// Password Hashing and Verification
///
/// Salted, deliberately slow bcrypt hashing. The cost factor comes from
/// configuration; tests run with the minimum cost.

use crate::error::AuthError;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    ///
    /// Every call draws a fresh salt, so hashing the same password twice
    /// yields two different strings.
    ///
    /// # Errors
    /// Returns `HashingFailure` if bcrypt rejects the cost or its salt source fails
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost).map_err(|e| AuthError::HashingFailure(e.to_string()))
    }

    /// Verify a password against its hash
    ///
    /// A mismatch and an unparsable stored hash are both reported as
    /// `InvalidCredentials`; only the log tells them apart.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        match bcrypt::verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be checked");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// `hash` on the blocking thread pool
    pub async fn hash_async(&self, password: String) -> Result<String, AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::HashingFailure(format!("hashing task failed: {}", e)))?
    }

    /// `verify` on the blocking thread pool
    pub async fn verify_async(&self, password: String, hash: String) -> Result<(), AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::HashingFailure(format!("verification task failed: {}", e)))?
    }
}
