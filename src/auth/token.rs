// Session token generation and hashing.
//
// Tokens are opaque 256-bit random values. Only the SHA-256 hash is ever
// persisted or logged; the raw token is returned to the caller exactly once.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generate a fresh high-entropy bearer token (hex, 64 chars).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way hash of a presented token, as stored in the session table.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
