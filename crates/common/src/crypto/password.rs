//! Share password hashing
//!
//! Shares may be gated behind a password that every visitor (owner excepted)
//! must re-enter once per session. Passwords are stored as salted Argon2id
//! hashes in PHC string format; the plaintext never leaves the login path.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as PhcHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

#[derive(Debug, thiserror::Error)]
pub enum PasswordHashError {
    #[error("password hash error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A stored share password, as an Argon2id PHC string.
///
/// Two comparisons live here and they are not interchangeable:
/// [`PasswordHash::verify`] checks a plaintext attempt against the hash,
/// while [`PasswordHash::ct_eq`] checks whether a previously stored hash
/// string is still the current one (the session elevation check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password with a fresh random salt.
    pub fn new(plaintext: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;
        Ok(Self(hash.to_string()))
    }

    /// Verify a plaintext attempt against this hash.
    ///
    /// A hash string that fails to parse verifies as false rather than
    /// erroring; a corrupt stored hash must never grant access.
    pub fn verify(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PhcHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Constant-time equality between this hash string and a candidate.
    pub fn ct_eq(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PasswordHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}
