// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication and authorization.

pub mod gate;
pub mod identity;
pub mod password;
pub mod policy;
pub mod rate_limit;
pub mod secret;
pub mod token;

pub use gate::{authorize, AuthorizationError, Operation, Resource};
pub use identity::Identity;
pub use password::{hash_password, verify_password};
pub use policy::{Authorized, Policy};
pub use rate_limit::AuthRateLimiter;
pub use secret::generate_secret;
pub use token::{Claims, TokenError, TokenService};
