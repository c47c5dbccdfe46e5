// ============================
// crates/backend-lib/src/auth/secret.rs
// ============================
//! Random signing secrets for bearer tokens.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Default secret size in bytes (384 bits of entropy)
const DEFAULT_SECRET_BYTES: usize = 48;

/// Generate a random HMAC secret, base64 URL-safe without padding.
///
/// Used when no `auth.jwt_secret` is configured; tokens signed with it
/// do not survive a restart.
pub fn generate_secret() -> String {
    generate_secret_with_size(DEFAULT_SECRET_BYTES)
}

pub fn generate_secret_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
