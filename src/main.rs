use chirpy::auth::AuthGateway;
use chirpy::configuration::get_configuration;
use chirpy::metrics::ApiMetrics;
use chirpy::startup::{run, AppState};
use chirpy::storage::{PgChirpStore, PgRefreshTokenStore, PgUserStore};
use chirpy::telemetry::{get_subscriber, init_subscriber};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_subscriber(get_subscriber("info", std::io::stdout));

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if let Err(e) = configuration.auth.validate() {
        tracing::error!("Invalid auth configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to migrate the database: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
        })?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let gateway = AuthGateway::new(
        users.clone(),
        Arc::new(PgRefreshTokenStore::new(pool.clone())),
        &configuration.auth,
    );

    let state = AppState {
        gateway,
        users,
        chirps: Arc::new(PgChirpStore::new(pool)),
        metrics: Arc::new(ApiMetrics::new()),
        static_dir: configuration.application.static_dir.clone(),
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, state)?;
    server.await
}
