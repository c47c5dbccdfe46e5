// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use zeroize::Zeroize;

/// Hash checked when no account matches, so a miss costs as much as a hit.
static DECOY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("decoy password for unknown accounts").ok());

/// Hash a password with Argon2id into a PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash a password and zeroize the plaintext
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain);
    plain.zeroize();
    hash
}

/// Hash a password on the blocking pool; Argon2 is deliberately slow.
pub async fn hash_password_blocking(mut plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password_secure(&mut plain)).await?
}

/// Verify a password on the blocking pool.
pub async fn verify_password_blocking(hash: String, mut plain: String) -> bool {
    tokio::task::spawn_blocking(move || {
        let ok = verify_password(&hash, &plain);
        plain.zeroize();
        ok
    })
    .await
    .unwrap_or(false)
}

/// Run a full verification against the decoy hash; always `false`.
pub async fn verify_unknown_account(mut plain: String) -> bool {
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(hash) = DECOY_HASH.as_deref() {
            verify_password(hash, &plain);
        }
        plain.zeroize();
    })
    .await;
    false
}
