/// Authentication gateway
///
/// Composes password hashing, access tokens and the refresh-token store
/// into the operations the HTTP layer calls.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::auth::jwt::{issue_access_token, verify_access_token};
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::AuthSettings;
use crate::error::AuthError;
use crate::storage::{User, UserStore};
use crate::validators::MAX_PASSWORD_BYTES;

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthGateway {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        settings: &AuthSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            hasher: PasswordHasher::new(settings.bcrypt_cost),
            secret: settings.jwt_secret.clone(),
            access_token_ttl: settings.access_token_ttl(),
            refresh_token_ttl: settings.refresh_token_ttl(),
        }
    }

    /// Check an e-mail/password pair and open a session
    ///
    /// `requested_ttl` may shorten the access token lifetime but never
    /// extends it past the configured window.
    ///
    /// # Errors
    /// Unknown e-mail, wrong password and a password longer than bcrypt
    /// accepts all give `InvalidCredentials`.
    /// Store and hashing problems surface as `StorageFailure`/`HashingFailure`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl: Option<Duration>,
    ) -> Result<LoginOutcome, AuthError> {
        // Stored addresses are trimmed at registration.
        let email = email.trim();
        if password.len() > MAX_PASSWORD_BYTES {
            tracing::debug!("Login rejected: password exceeds bcrypt input limit");
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Same bcrypt work as the known-user path.
                self.hasher.hash_async(password.to_string()).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.hasher
            .verify_async(password.to_string(), user.hashed_password.clone())
            .await?;

        let ttl = self.bounded_access_ttl(requested_ttl);
        let access_token = issue_access_token(&user.id, &self.secret, ttl)?;
        let refresh_token = self
            .refresh_tokens
            .issue(user.id, self.refresh_token_ttl)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Resolve a bearer access token to the user it represents
    pub fn authenticate(&self, bearer_token: &str) -> Result<Uuid, AuthError> {
        verify_access_token(bearer_token, &self.secret)
    }

    /// Exchange a refresh token for a fresh access token
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user_id = self.refresh_tokens.resolve(refresh_token).await?;
        let access_token = issue_access_token(&user_id, &self.secret, self.access_token_ttl)?;

        tracing::debug!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await
    }

    /// Revoke every refresh token of `user_id`
    pub async fn revoke_sessions(&self, user_id: Uuid) -> Result<u64, AuthError> {
        self.refresh_tokens.revoke_all_for_user(user_id).await
    }

    /// Hash a password for registration or a credential change
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        self.hasher.hash_async(password.to_string()).await
    }

    fn bounded_access_ttl(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(ttl) if ttl > Duration::zero() && ttl < self.access_token_ttl => ttl,
            _ => self.access_token_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryRefreshTokenStore, InMemoryUserStore};

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
            bcrypt_cost: 4,
        }
    }

    fn gateway() -> AuthGateway {
        AuthGateway::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRefreshTokenStore::new()),
            &settings(),
        )
    }

    #[test]
    fn test_requested_ttl_is_bounded() {
        let gateway = gateway();
        let max = Duration::hours(1);

        assert_eq!(gateway.bounded_access_ttl(None), max);
        assert_eq!(gateway.bounded_access_ttl(Some(Duration::seconds(60))), Duration::seconds(60));
        assert_eq!(gateway.bounded_access_ttl(Some(Duration::hours(5))), max);
        assert_eq!(gateway.bounded_access_ttl(Some(Duration::seconds(0))), max);
        assert_eq!(gateway.bounded_access_ttl(Some(Duration::seconds(-5))), max);
    }

    #[test]
    fn test_authenticate_rejects_garbage() {
        assert_eq!(gateway().authenticate("garbage"), Err(AuthError::TokenMalformed));
    }

    #[tokio::test]
    async fn test_logout_unknown_token() {
        assert_eq!(
            gateway().logout("never-issued").await,
            Err(AuthError::RefreshTokenNotFound)
        );
    }

    #[tokio::test]
    async fn test_login_trims_email_like_registration() {
        let gateway = gateway();
        let email = crate::validators::is_valid_email(" saul@bettercall.com ").unwrap();
        let hashed = gateway.hash_password("123456").await.unwrap();
        gateway.users.create(&email, &hashed).await.unwrap();

        let outcome = gateway
            .login(" saul@bettercall.com ", "123456", None)
            .await
            .expect("Login with padded email failed");
        assert_eq!(outcome.user.email, "saul@bettercall.com");
    }

    #[tokio::test]
    async fn test_login_rejects_password_past_bcrypt_limit() {
        let gateway = gateway();
        let password = "p".repeat(MAX_PASSWORD_BYTES);
        let hashed = gateway.hash_password(&password).await.unwrap();
        gateway.users.create("walt@breakingbad.com", &hashed).await.unwrap();

        let longer = format!("{}suffix", password);
        assert!(matches!(
            gateway.login("walt@breakingbad.com", &longer, None).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(gateway.login("walt@breakingbad.com", &password, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_unrepresentable_refresh_lifetime_is_an_error() {
        let mut settings = settings();
        settings.refresh_token_expiry = 10_000_000_000_000;
        let gateway = AuthGateway::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRefreshTokenStore::new()),
            &settings,
        );
        let hashed = gateway.hash_password("123456").await.unwrap();
        gateway.users.create("saul@bettercall.com", &hashed).await.unwrap();

        let result = gateway.login("saul@bettercall.com", "123456", None).await;
        assert!(matches!(result, Err(AuthError::LifetimeOutOfRange)));
    }
}
