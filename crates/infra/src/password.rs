//! Password verification.
//!
//! Argon2id with OWASP parameters: m=19456 (19 MiB), t=2, p=1.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Well-formed Argon2id hash with the verifier's cost parameters that no
/// password matches. Login checks against it when the account is unknown so
/// both rejection paths do the same amount of hashing.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$cG9ydGFsLWR1bW15LXNsdA$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Boolean password comparison used by login.
pub trait PasswordVerifier: Send + Sync {
    /// `true` iff `password` matches `stored_hash`. Unreadable hashes are a mismatch.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

#[derive(Clone)]
pub struct Argon2PasswordVerifier {
    argon2: Argon2<'static>,
}

impl Argon2PasswordVerifier {
    pub fn new() -> Self {
        let params = Params::new(19456, 2, 1, None).unwrap_or_else(|_| Params::default());
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password in PHC string format (seeding and tests).
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }
}

impl Default for Argon2PasswordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                return false;
            }
        };

        match argon2::PasswordVerifier::verify_password(&self.argon2, password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                tracing::warn!(error = %e, "password verification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let verifier = Argon2PasswordVerifier::new();
        let hash = verifier.hash("correct horse").unwrap();
        assert!(verifier.verify("correct horse", &hash));
        assert!(!verifier.verify("wrong horse", &hash));
    }

    #[test]
    fn unreadable_hash_is_a_mismatch() {
        let verifier = Argon2PasswordVerifier::new();
        assert!(!verifier.verify("anything", "not-a-phc-string"));
        assert!(!verifier.verify("anything", ""));
    }

    #[test]
    fn dummy_hash_costs_the_same_and_never_matches() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        let params = Params::try_from(&parsed).unwrap();
        assert_eq!((params.m_cost(), params.t_cost(), params.p_cost()), (19456, 2, 1));

        let verifier = Argon2PasswordVerifier::new();
        assert!(!verifier.verify("", DUMMY_PASSWORD_HASH));
        assert!(!verifier.verify("ChangeMe123!", DUMMY_PASSWORD_HASH));
    }

    #[test]
    fn hashes_are_salted() {
        let verifier = Argon2PasswordVerifier::new();
        assert_ne!(verifier.hash("pw").unwrap(), verifier.hash("pw").unwrap());
    }
}
