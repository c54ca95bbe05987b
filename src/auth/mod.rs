/// Authentication module
///
/// Password hashing, access token generation/validation, refresh token
/// storage, and the gateway that composes them.

mod claims;
mod gateway;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ISSUER};
pub use gateway::{AuthGateway, LoginOutcome};
pub use jwt::{issue_access_token, verify_access_token};
pub use password::{PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use refresh_token::{generate_refresh_token, hash_token, RefreshTokenRecord, RefreshTokenStore};
