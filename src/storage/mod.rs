/// Storage module
///
/// Store traits used by the auth gateway and the route handlers, with an
/// in-memory backend and a Postgres backend.

mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;

pub use memory::{InMemoryChirpStore, InMemoryRefreshTokenStore, InMemoryUserStore};
pub use postgres::{PgChirpStore, PgRefreshTokenStore, PgUserStore};

/// A registered user together with their credential
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("hashed_password", &"[redacted]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    /// `UniqueConstraintViolation` if the e-mail is taken
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Replace e-mail and password hash wholesale
    ///
    /// # Errors
    /// `NotFound` for an unknown user, `UniqueConstraintViolation` if the
    /// new e-mail belongs to someone else
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, DatabaseError>;

    /// All chirps, oldest first
    async fn list(&self) -> Result<Vec<Chirp>, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError>;
}
