/// Middleware module
///
/// Request extractors for bearer tokens and the file-server hit counter.

mod authenticated;
mod hit_counter;

pub use authenticated::{bearer_token, AuthenticatedUser, BearerToken};
pub use hit_counter::HitCounter;
