// src/utils/crypto.rs

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, thread_rng, Rng, RngCore};
use secrecy::{ExposeSecret, Secret};
use serde::{Serialize, Serializer};

/// Number of raw bytes behind an LFS JWT signing secret.
pub const LFS_JWT_SECRET_LEN: usize = 32;

const TOKEN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A wrapper around Secret<String> with additional utility methods.
///
/// Debug output and serialization never reveal the value.
#[derive(Debug)]
pub struct SecureString(Secret<String>);

impl SecureString {
    pub fn new(value: String) -> Self {
        Self(Secret::new(value))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn preview(&self) -> String {
        let chars: Vec<char> = self.0.expose_secret().chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        } else {
            "*".repeat(chars.len())
        }
    }
}

impl Clone for SecureString {
    fn clone(&self) -> Self {
        Self::new(self.expose_secret().to_owned())
    }
}

impl Default for SecureString {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Serialize for SecureString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str("[REDACTED]")
        }
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// Generates a fresh LFS JWT secret: 32 random bytes, base64url without padding.
pub fn new_lfs_jwt_secret() -> String {
    let mut bytes = [0u8; LFS_JWT_SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes an LFS JWT secret, returning the raw bytes only when exactly 32 bytes decode.
pub fn decode_lfs_jwt_secret(encoded: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .ok()
        .filter(|bytes| bytes.len() == LFS_JWT_SECRET_LEN)
}

/// Generates a random alphanumeric token of the given length.
pub fn new_random_token(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| TOKEN_CHARS[rng.gen_range(0..TOKEN_CHARS.len())] as char)
        .collect()
}

/// Generates the internal access token shared by the web process and its hooks.
pub fn new_internal_token() -> String {
    new_random_token(64)
}

/// Generates a value suitable for `[security] SECRET_KEY`.
pub fn new_secret_key() -> String {
    new_random_token(64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfs_secret_decodes_to_32_bytes() {
        let secret = new_lfs_jwt_secret();
        assert!(!secret.contains('='));
        assert_eq!(decode_lfs_jwt_secret(&secret).map(|b| b.len()), Some(32));
    }

    #[test]
    fn test_short_lfs_secret_is_rejected() {
        let short = URL_SAFE_NO_PAD.encode([7u8; 16]);
        assert!(decode_lfs_jwt_secret(&short).is_none());
        assert!(decode_lfs_jwt_secret("not base64 !!").is_none());
    }

    #[test]
    fn test_internal_token_is_alphanumeric() {
        let token = new_internal_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, new_internal_token());
    }

    #[test]
    fn test_secure_string_redacts() {
        let secret = SecureString::from("super-secret-value");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"[REDACTED]\"");
        assert!(!format!("{secret:?}").contains("super-secret-value"));
        assert_eq!(secret.preview(), "supe...alue");
    }
}
