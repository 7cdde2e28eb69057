//! URL signatures
//!
//! A signature is the SHA-256 digest of the canonical URL's UTF-8 bytes,
//! rendered as 64 lowercase hex characters.

use sha2::{Digest, Sha256};

/// Length of a signature in hex characters.
pub const SIGNATURE_LEN: usize = 64;

/// Compute the signature of a canonical URL.
pub fn sign(canonical_url: &str) -> String {
    let digest = Sha256::digest(canonical_url.as_bytes());
    hex::encode(digest)
}

/// Whether `s` has the shape of a signature.
pub fn is_signature(s: &str) -> bool {
    s.len() == SIGNATURE_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
