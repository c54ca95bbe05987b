use chrono::Duration;

use crate::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;
/// Ten years, in seconds
const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 3600;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/app`
    pub static_dir: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Secret material and lifetimes handed to the auth gateway at startup
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_expiry: i64,  // seconds (3600 = 1 hour)
    pub refresh_token_expiry: i64, // seconds (5184000 = 60 days)
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    /// Saturates instead of panicking when the setting was never validated
    pub fn access_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.access_token_expiry).unwrap_or_else(Duration::max_value)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.refresh_token_expiry).unwrap_or_else(Duration::max_value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        for (name, value) in [
            ("auth.access_token_expiry", self.access_token_expiry),
            ("auth.refresh_token_expiry", self.refresh_token_expiry),
        ] {
            if !(1..=MAX_TOKEN_EXPIRY).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be between 1 and {} seconds",
                    name, MAX_TOKEN_EXPIRY
                )));
            }
        }
        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080_i64)?
        .set_default("application.static_dir", "./public")?
        .set_default("auth.access_token_expiry", 3600_i64)?
        .set_default("auth.refresh_token_expiry", 60_i64 * 24 * 3600)?
        .set_default("auth.bcrypt_cost", 10_i64)?
        .add_source(config::File::with_name("configuration").required(false))
        // e.g. APP__AUTH__JWT_SECRET
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
