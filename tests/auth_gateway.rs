use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chirpy::auth::{verify_access_token, AuthGateway, RefreshTokenStore};
use chirpy::configuration::AuthSettings;
use chirpy::error::AuthError;
use chirpy::storage::{InMemoryRefreshTokenStore, InMemoryUserStore, User, UserStore};
use chrono::Duration;

const SECRET: &str = "gateway-test-secret-of-sufficient-length";

struct TestGateway {
    gateway: AuthGateway,
    users: Arc<InMemoryUserStore>,
    refresh_tokens: Arc<InMemoryRefreshTokenStore>,
}

fn spawn_gateway() -> TestGateway {
    let settings = AuthSettings {
        jwt_secret: SECRET.to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 5_184_000,
        bcrypt_cost: 4,
    };
    let users = Arc::new(InMemoryUserStore::new());
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());

    TestGateway {
        gateway: AuthGateway::new(users.clone(), refresh_tokens.clone(), &settings),
        users,
        refresh_tokens,
    }
}

impl TestGateway {
    async fn register(&self, email: &str, password: &str) -> User {
        let hashed = self
            .gateway
            .hash_password(password)
            .await
            .expect("Failed to hash password");
        self.users
            .create(email, &hashed)
            .await
            .expect("Failed to create user")
    }
}

#[tokio::test]
async fn login_then_authenticate_resolves_the_user() {
    let app = spawn_gateway();
    let user = app.register("saul@bettercall.com", "123456").await;

    let outcome = app
        .gateway
        .login("saul@bettercall.com", "123456", None)
        .await
        .expect("Login failed");

    assert_eq!(outcome.user.id, user.id);
    assert_eq!(app.gateway.authenticate(&outcome.access_token), Ok(user.id));
    assert_eq!(verify_access_token(&outcome.access_token, SECRET), Ok(user.id));
    assert_eq!(
        verify_access_token(&outcome.access_token, "another-secret-of-sufficient-length!"),
        Err(AuthError::TokenMalformed)
    );
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email_alike() {
    let app = spawn_gateway();
    app.register("saul@bettercall.com", "123456").await;

    let wrong_password = app.gateway.login("saul@bettercall.com", "nope", None).await;
    let unknown_email = app.gateway.login("kim@wexler.com", "123456", None).await;

    assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
    assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn refresh_then_logout() {
    let app = spawn_gateway();
    let user = app.register("saul@bettercall.com", "123456").await;
    let outcome = app
        .gateway
        .login("saul@bettercall.com", "123456", Some(Duration::seconds(30)))
        .await
        .expect("Login failed");

    let access_token = app
        .gateway
        .refresh(&outcome.refresh_token)
        .await
        .expect("Refresh failed");
    assert_eq!(app.gateway.authenticate(&access_token), Ok(user.id));

    app.gateway
        .logout(&outcome.refresh_token)
        .await
        .expect("Logout failed");
    assert_eq!(
        app.gateway.refresh(&outcome.refresh_token).await,
        Err(AuthError::TokenRevoked)
    );
    // Access tokens already issued stay valid until they expire.
    assert_eq!(app.gateway.authenticate(&access_token), Ok(user.id));
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_then_reported_revoked() {
    let app = spawn_gateway();
    let user = app.register("saul@bettercall.com", "123456").await;
    let token = app
        .refresh_tokens
        .issue(user.id, Duration::seconds(-1))
        .await
        .unwrap();

    assert_eq!(app.gateway.refresh(&token).await, Err(AuthError::TokenExpired));
    assert_eq!(app.gateway.refresh(&token).await, Err(AuthError::TokenRevoked));
}

#[tokio::test]
async fn revoke_sessions_ends_every_refresh_token() {
    let app = spawn_gateway();
    let user = app.register("saul@bettercall.com", "123456").await;
    let first = app
        .gateway
        .login("saul@bettercall.com", "123456", None)
        .await
        .unwrap();
    let second = app
        .gateway
        .login("saul@bettercall.com", "123456", None)
        .await
        .unwrap();

    assert_eq!(app.gateway.revoke_sessions(user.id).await, Ok(2));
    assert_eq!(
        app.gateway.refresh(&first.refresh_token).await,
        Err(AuthError::TokenRevoked)
    );
    assert_eq!(
        app.gateway.refresh(&second.refresh_token).await,
        Err(AuthError::TokenRevoked)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_never_succeeds_once_revoke_has_returned() {
    let app = Arc::new(spawn_gateway());
    app.register("saul@bettercall.com", "123456").await;

    for _ in 0..200 {
        let outcome = app
            .gateway
            .login("saul@bettercall.com", "123456", None)
            .await
            .unwrap();
        let token = Arc::new(outcome.refresh_token);
        let revoked = Arc::new(AtomicBool::new(false));

        let mut refreshes = Vec::new();
        for _ in 0..8 {
            let app = app.clone();
            let token = token.clone();
            let revoked = revoked.clone();
            refreshes.push(tokio::spawn(async move {
                let revoked_before = revoked.load(Ordering::SeqCst);
                (revoked_before, app.gateway.refresh(&token).await)
            }));
        }
        let revoke = {
            let app = app.clone();
            let token = token.clone();
            let revoked = revoked.clone();
            tokio::spawn(async move {
                let result = app.gateway.logout(&token).await;
                revoked.store(true, Ordering::SeqCst);
                result
            })
        };

        assert_eq!(revoke.await.unwrap(), Ok(()));
        for refresh in refreshes {
            match refresh.await.unwrap() {
                (true, Ok(_)) => panic!("refresh succeeded after the revoke returned"),
                (_, Ok(_)) | (_, Err(AuthError::TokenRevoked)) => {}
                (_, other) => panic!("unexpected refresh outcome: {:?}", other),
            }
        }
        assert_eq!(app.gateway.refresh(&token).await, Err(AuthError::TokenRevoked));
    }
}
