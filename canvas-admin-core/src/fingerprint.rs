//! Token Fingerprints - SHA-256 for Log Correlation
//!
//! Tokens never reach the logs. A truncated hash lets two log lines be
//! matched to the same session without exposing the credential.

use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// First 8 bytes of the token's SHA-256, as 16 hex characters.
pub fn token_fingerprint(token: &str) -> String {
    let mut digest = sha256_hex(token.as_bytes());
    digest.truncate(FINGERPRINT_BYTES * 2);
    digest
}
