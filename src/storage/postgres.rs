use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Chirp, ChirpStore, User, UserStore};
use crate::auth::{generate_refresh_token, hash_token, RefreshTokenRecord, RefreshTokenStore};
use crate::error::{AuthError, DatabaseError};

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);
type ChirpRow = (Uuid, String, Uuid, DateTime<Utc>, DateTime<Utc>);

fn user_from_row((id, email, hashed_password, created_at, updated_at): UserRow) -> User {
    User {
        id,
        email,
        hashed_password,
        created_at,
        updated_at,
    }
}

fn chirp_from_row((id, body, user_id, created_at, updated_at): ChirpRow) -> Chirp {
    Chirp {
        id,
        body,
        user_id,
        created_at,
        updated_at,
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

        Ok(user_from_row(row))
    }
}

#[derive(Clone)]
pub struct PgChirpStore {
    pool: PgPool,
}

impl PgChirpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChirpStore for PgChirpStore {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, DatabaseError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            r#"
            INSERT INTO chirps (id, body, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, body, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(chirp_from_row(row))
    }

    async fn list(&self) -> Result<Vec<Chirp>, DatabaseError> {
        let rows = sqlx::query_as::<_, ChirpRow>(
            "SELECT id, body, user_id, created_at, updated_at FROM chirps ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(chirp_from_row).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            "SELECT id, body, user_id, created_at, updated_at FROM chirps WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(chirp_from_row))
    }
}

/// Refresh tokens in Postgres
///
/// Lookups lock the row (`FOR UPDATE`) for the length of a transaction, and
/// revocation is a single `UPDATE`, so the two serialize on the row lock.
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let record = RefreshTokenRecord::new(user_id, ttl)?;
        let token = generate_refresh_token();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(hash_token(&token))
        .bind(record.user_id)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_hash = hash_token(token);
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let (user_id, expires_at, revoked_at) =
            sqlx::query_as::<_, (Uuid, DateTime<Utc>, Option<DateTime<Utc>>)>(
                r#"
                SELECT user_id, expires_at, revoked_at
                FROM refresh_tokens
                WHERE token_hash = $1
                FOR UPDATE
                "#,
            )
            .bind(&token_hash)
            .fetch_optional(&mut tx)
            .await
            .map_err(DatabaseError::from)?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        let mut record = RefreshTokenRecord {
            user_id,
            expires_at,
            revoked_at,
        };
        let now = Utc::now();
        let outcome = record.resolve_at(now);

        if outcome == Err(AuthError::TokenExpired) {
            sqlx::query("UPDATE refresh_tokens SET revoked_at = $1 WHERE token_hash = $2")
                .bind(now)
                .bind(&token_hash)
                .execute(&mut tx)
                .await
                .map_err(DatabaseError::from)?;
            tracing::info!(user_id = %user_id, "Refresh token expired and revoked");
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        outcome
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $1)
            WHERE token_hash = $2
            "#,
        )
        .bind(Utc::now())
        .bind(hash_token(token))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::RefreshTokenNotFound);
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1
            WHERE user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        tracing::info!(user_id = %user_id, "All refresh tokens revoked for user");
        Ok(result.rows_affected())
    }
}
