//! Integration tests for the public and admin surface of the chirpy server

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::AuthGateway;
use chirpy::configuration::AuthSettings;
use chirpy::metrics::ApiMetrics;
use chirpy::startup::{run, AppState};
use chirpy::storage::{InMemoryChirpStore, InMemoryRefreshTokenStore, InMemoryUserStore};
use serde_json::{json, Value};

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = AuthSettings {
        jwt_secret: "integration-test-secret-of-sufficient-length".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 5_184_000,
        bcrypt_cost: 4,
    };
    let users = Arc::new(InMemoryUserStore::new());
    let state = AppState {
        gateway: AuthGateway::new(
            users.clone(),
            Arc::new(InMemoryRefreshTokenStore::new()),
            &settings,
        ),
        users,
        chirps: Arc::new(InMemoryChirpStore::new()),
        metrics: Arc::new(ApiMetrics::new()),
        static_dir: "public".to_string(),
    };

    let server = run(listener, state).expect("Failed to create server");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/healthz", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn app_serves_static_index() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/app/", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Welcome to Chirpy"));
}

#[tokio::test]
async fn metrics_count_app_hits_and_reset_clears_them() {
    let addr = spawn_app();
    let client = reqwest::Client::new();

    for _ in 0..3 {
        client
            .get(&format!("{}/app/", addr))
            .send()
            .await
            .expect("Failed to execute request");
    }
    // API traffic is not counted
    client
        .get(&format!("{}/api/healthz", addr))
        .send()
        .await
        .expect("Failed to execute request");

    let body = client
        .get(&format!("{}/admin/metrics", addr))
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .unwrap();
    assert!(body.contains("Chirpy has been visited 3 times!"), "{}", body);

    let response = client
        .post(&format!("{}/admin/reset", addr))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body = client
        .get(&format!("{}/admin/metrics", addr))
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .unwrap();
    assert!(body.contains("Chirpy has been visited 0 times!"), "{}", body);
}

#[tokio::test]
async fn validate_chirp_masks_profanity() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/validate_chirp", addr))
        .json(&json!({ "body": "This is a kerfuffle opinion I need to share with the world" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["cleaned_body"],
        "This is a **** opinion I need to share with the world"
    );
}

#[tokio::test]
async fn validate_chirp_rejects_long_body() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/validate_chirp", addr))
        .json(&json!({ "body": "a".repeat(141) }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_chirp_rejects_bad_and_unknown_ids() {
    let addr = spawn_app();
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/chirps/not-a-uuid", addr))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(400, response.status().as_u16());

    let response = client
        .get(&format!("{}/api/chirps/{}", addr, uuid::Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn list_chirps_starts_empty() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/chirps", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!([]));
}
