//! Password hashing

use anyhow::{Result, anyhow};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use rand::rngs::OsRng;

/// Random bytes in a generated password (hex encoded, so twice as many characters)
const GENERATED_PASSWORD_BYTES: usize = 12;

/// Well-formed hash with default parameters, checked when a username is
/// unknown so the failure costs the same as a wrong password
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$NzLoBzdVaDRAdLttTASUXw$kyHQdAqOOOdlA6peNfU+yPzGLekigOqpOvKSm+GI5fk";

/// Hash a password into a PHC string with a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Random password printed by `create-user` when none is given
pub fn generate_password() -> String {
    let mut bytes = [0u8; GENERATED_PASSWORD_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
