use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{Chirp, ChirpStore, User, UserStore};
use crate::auth::{generate_refresh_token, hash_token, RefreshTokenRecord, RefreshTokenStore};
use crate::error::{AuthError, DatabaseError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DatabaseError> {
    mutex
        .lock()
        .map_err(|_| DatabaseError::UnexpectedError("store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryChirpStore {
    chirps: Mutex<Vec<Chirp>>,
}

impl InMemoryChirpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChirpStore for InMemoryChirpStore {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, DatabaseError> {
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        lock(&self.chirps)?.push(chirp.clone());
        Ok(chirp)
    }

    async fn list(&self) -> Result<Vec<Chirp>, DatabaseError> {
        Ok(lock(&self.chirps)?.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError> {
        Ok(lock(&self.chirps)?.iter().find(|c| c.id == id).cloned())
    }
}

/// Refresh tokens keyed by SHA-256 digest
///
/// Every operation runs under one mutex, so a lookup and a revocation of
/// the same token can never interleave.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let record = RefreshTokenRecord::new(user_id, ttl)?;
        let token = generate_refresh_token();
        lock(&self.tokens)?.insert(hash_token(&token), record);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut tokens = lock(&self.tokens)?;
        let record = tokens
            .get_mut(&hash_token(token))
            .ok_or(AuthError::RefreshTokenNotFound)?;

        let outcome = record.resolve_at(Utc::now());
        if outcome == Err(AuthError::TokenExpired) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired and revoked");
        }
        outcome
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let mut tokens = lock(&self.tokens)?;
        let record = tokens
            .get_mut(&hash_token(token))
            .ok_or(AuthError::RefreshTokenNotFound)?;
        record.revoke_at(Utc::now());
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut revoked = 0;
        for record in lock(&self.tokens)?
            .values_mut()
            .filter(|r| r.user_id == user_id && !r.is_revoked())
        {
            record.revoke_at(now);
            revoked += 1;
        }
        Ok(revoked)
    }
}
