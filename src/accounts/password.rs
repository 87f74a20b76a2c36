//! Salted password hashing in PHC string format (`$pbkdf2-sha256$i=...`).

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use zeroize::Zeroize;

use super::AccountError;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash `password` with PBKDF2-SHA256 and a fresh random salt.
pub fn hash_password(password: &str, rounds: u32) -> Result<String, AccountError> {
    let mut salt_bytes = generate_salt();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AccountError::Hashing(e.to_string()));
    salt_bytes.zeroize();
    let salt = salt?;

    let params = Params {
        rounds,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|e| AccountError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// A stored value that does not parse is reported as `Hashing` so callers
/// can log it separately from an ordinary mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AccountError::Hashing(e.to_string()))?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
}
