//! Thin wrapper around argon2 so callers can tell "wrong password" from
//! "the stored hash is corrupt" — the former is a 401, the latter a 500.

use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The stored hash failed to parse or the verifier itself faulted.
    /// Never surfaced to clients as an authentication failure.
    #[error("stored credential hash is unusable: {0}")]
    BadHash(argon2::password_hash::Error),
}

pub fn hash(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(CredentialError::BadHash)
}

/// `Ok(false)` is a mismatch; `Err` means the stored hash is bad data.
/// The argon2 primitive already runs in constant time relative to where
/// a mismatch occurs, and this wrapper adds no short-circuit.
pub fn verify(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored_hash).map_err(CredentialError::BadHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::BadHash(e)),
    }
}

/// Burns a verification against a fixed hash. Run when a login names an
/// unknown username, so that path costs the same as a real mismatch and
/// timing does not reveal whether the account exists.
pub fn verify_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let dummy = DUMMY_HASH.get_or_init(|| {
        hash("muster-dummy-credential").unwrap_or_default()
    });
    let _ = verify(password, dummy);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hashed = hash("correct horse").unwrap();
        assert!(verify("correct horse", &hashed).unwrap());
        assert!(!verify("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let result = verify("anything", "not-a-phc-string");
        assert!(matches!(result, Err(CredentialError::BadHash(_))));
    }
}
