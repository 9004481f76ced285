//! Hashing and random secret generation.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind an invite code (8 hex characters).
const INVITE_CODE_BYTES: usize = 4;

/// Number of random bytes behind an email verification token.
const VERIFICATION_TOKEN_BYTES: usize = 20;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns `len` random bytes encoded as lowercase hex.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates an invite code such as `AB12CD34`.
pub fn generate_invite_code() -> String {
    random_hex(INVITE_CODE_BYTES).to_uppercase()
}

/// Generates a raw email verification token.
///
/// Only [`sha256_hex`] of this value is persisted; the raw token travels in
/// the verification link.
pub fn generate_verification_token() -> String {
    random_hex(VERIFICATION_TOKEN_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_random_hex_length() {
        assert_eq!(random_hex(4).len(), 8);
        assert_eq!(random_hex(0).len(), 0);
    }

    #[test]
    fn test_invite_code_format() {
        let code = generate_invite_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_verification_token_is_not_its_hash() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 40);
        assert_ne!(token, sha256_hex(&token));
    }

    #[test]
    fn test_verification_tokens_unique() {
        assert_ne!(generate_verification_token(), generate_verification_token());
    }
}
