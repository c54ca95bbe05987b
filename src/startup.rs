use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthGateway;
use crate::metrics::ApiMetrics;
use crate::middleware::HitCounter;
use crate::routes::{
    check_chirp, create_chirp, create_user, get_chirp, health_check, list_chirps, login, metrics,
    refresh, reset, revoke, update_user,
};
use crate::storage::{ChirpStore, UserStore};

/// Everything the handlers share, built once by the embedding process
#[derive(Clone)]
pub struct AppState {
    pub gateway: AuthGateway,
    pub users: Arc<dyn UserStore>,
    pub chirps: Arc<dyn ChirpStore>,
    pub metrics: Arc<ApiMetrics>,
    /// Directory served under `/app`
    pub static_dir: String,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let gateway = web::Data::new(state.gateway);
    let users: web::Data<dyn UserStore> = web::Data::from(state.users);
    let chirps: web::Data<dyn ChirpStore> = web::Data::from(state.chirps);
    let api_metrics = web::Data::from(state.metrics);
    let static_dir = state.static_dir;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(gateway.clone())
            .app_data(users.clone())
            .app_data(chirps.clone())
            .app_data(api_metrics.clone())
            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/validate_chirp", web::post().to(check_chirp))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            // Create is public, update requires an access token
            .service(
                web::resource("/api/users")
                    .route(web::post().to(create_user))
                    .route(web::put().to(update_user)),
            )
            .service(
                web::resource("/api/chirps")
                    .route(web::get().to(list_chirps))
                    .route(web::post().to(create_chirp)),
            )
            .route("/api/chirps/{chirp_id}", web::get().to(get_chirp))
            // Admin
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))
            // Static files, counted
            .service(
                web::scope("/app")
                    .wrap(HitCounter::new(api_metrics.clone().into_inner()))
                    .service(fs::Files::new("/", static_dir.clone()).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
