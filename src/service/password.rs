use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hex-encoded SHA-256 of the password, the format stored in `users.password`.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let candidate = hash_password(password);
    bool::from(candidate.as_bytes().ct_eq(stored_hash.as_bytes()))
}
