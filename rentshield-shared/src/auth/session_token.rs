//! Opaque session tokens
//!
//! A token is 32 bytes from the OS RNG, hex-encoded (64 characters, 256 bits
//! of entropy). The plaintext is handed to the client once; the server keeps
//! only its SHA-256 digest, so a leaked sessions table cannot be replayed.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

/// Length of an encoded token
pub const SESSION_TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a new token and its storage hash
///
/// Returns `(token, hash)`. Only the hash may be persisted.
pub fn generate_session_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_session_token(&token);
    (token, hash)
}

/// SHA-256 hex digest of a token
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check before touching the store
///
/// Rejects anything that isn't 64 lowercase hex characters.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let (token1, hash1) = generate_session_token();
        let (token2, hash2) = generate_session_token();

        assert_eq!(token1.len(), 64);
        assert!(is_well_formed(&token1));
        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);
        assert_eq!(hash1, hash_session_token(&token1));
    }

    #[test]
    fn test_hash_is_deterministic_and_not_the_token() {
        let (token, _) = generate_session_token();
        let hash = hash_session_token(&token);

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_session_token(&token));
        assert_ne!(hash, token);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&"0123456789abcdef".repeat(4)));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed(&"0123456789ABCDEF".repeat(4)));
        assert!(!is_well_formed(&"g".repeat(64)));
        assert!(!is_well_formed(&"a".repeat(63)));
    }
}
