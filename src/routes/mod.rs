mod admin;
mod auth;
mod chirps;
mod health_check;
mod users;

pub use admin::{metrics, reset};
pub use auth::{login, refresh, revoke, LoginRequest, LoginResponse, RefreshResponse};
pub use chirps::{
    check_chirp, create_chirp, get_chirp, list_chirps, ChirpRequest, ChirpResponse,
    CleanedChirpResponse,
};
pub use health_check::health_check;
pub use users::{create_user, update_user, CredentialsRequest, UserResponse};
