//! Password hashing.
//!
//! Passwords are stored as salted PBKDF2-HMAC-SHA256 hashes encoded as
//! `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::{CoreError, Result};

/// Iteration count used when none is configured.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Shortest password accepted by [`check_policy`].
pub const MIN_PASSWORD_LEN: usize = 6;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Reject passwords that do not satisfy the policy.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPassword`] when the password is shorter than
/// [`MIN_PASSWORD_LEN`] characters.
pub fn check_policy(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::InvalidPassword(format!(
            "must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPassword`] if `iterations` is zero.
pub fn hash_password(password: &str, iterations: u32) -> Result<String> {
    if iterations == 0 {
        return Err(CoreError::InvalidPassword(
            "iteration count must be positive".into(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt, iterations);
    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    ))
}

/// Check a password against a stored hash.
///
/// Malformed or foreign encodings never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let actual = hex::encode(derive(password, &salt, iterations));
    constant_time_eq(&actual, expected)
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
