//! Authentication for the web UI and API
//!
//! Users log in with a username and an Argon2-hashed password; the session
//! lives in a private (encrypted) cookie.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, require_auth};

use cookie::Key;
use sha2::{Digest, Sha512};
use tracing::warn;

pub const LOGIN_PATH: &str = "/accounts/login/";
pub const LOGOUT_PATH: &str = "/accounts/logout/";

/// Key for the private session cookie.
///
/// Derived from `secret` so sessions survive restarts; a random key is used
/// when no secret is configured.
pub fn cookie_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => Key::from(Sha512::digest(secret.as_bytes()).as_slice()),
        None => {
            warn!("SESSION_SECRET not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

/// Post-login redirect target. Only same-origin paths are honored.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_is_deterministic_for_secret() {
        let secret = "0123456789abcdef0123456789abcdef";
        assert_eq!(
            cookie_key(Some(secret)).master(),
            cookie_key(Some(secret)).master()
        );
        assert_ne!(
            cookie_key(Some(secret)).master(),
            cookie_key(Some("another secret of sufficient length!")).master()
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/risks/prioritize/")), "/risks/prioritize/");
        assert_eq!(safe_next(Some("/risks/?status=accepted")), "/risks/?status=accepted");
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(Some("https://evil.example.com/")), "/");
        assert_eq!(safe_next(Some("//evil.example.com/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example.com")), "/");
    }
}
