//! Argon2id credential hashing for account passwords.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash checked when a login names no account, so unknown and
    /// known emails cost the same argon2 verification.
    static ref DECOY_HASH: Option<String> = hash_password("no-account-has-this-password").ok();
}

fn hasher() -> Argon2<'static> {
    Argon2::default()
}

/// Hashes a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(hasher().verify_password(plain.as_bytes(), &parsed).is_ok())
}

/// Checks a login attempt. `stored` is the account's hash, or `None` when the
/// email matched no account; that case still runs a full verification against
/// the decoy hash and always reports a mismatch.
pub fn check_credentials(plain: &str, stored: Option<&str>) -> anyhow::Result<bool> {
    match stored {
        Some(stored) => verify_password(plain, stored),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref() {
                verify_password(plain, decoy)?;
            }
            Ok(false)
        }
    }
}
