//! Public share tokens
//!
//! A share that is publicly accessible carries one of these tokens in its
//! record. Anyone presenting the token gets read access without an account,
//! so tokens are generated from a CSPRNG and compared in constant time.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// The URL-safe token alphabet. 64 symbols, so each character carries
/// exactly 6 bits of the random stream.
pub const TOKEN_ALPHABET: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Default token length in characters (384 bits).
pub const TOKEN_LENGTH: usize = 64;

/// A capability token granting read access to a single share.
///
/// Tokens are interchangeable with the string column they are stored in;
/// the type exists to keep generation and comparison in one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicToken(String);

impl PublicToken {
    /// Generate a new token of the default length using a cryptographically
    /// secure RNG.
    pub fn generate() -> Self {
        Self::generate_with_len(TOKEN_LENGTH)
    }

    /// Generate a token of `len` characters.
    ///
    /// Each output character consumes one random byte masked to 6 bits, so
    /// the alphabet is sampled uniformly.
    pub fn generate_with_len(len: usize) -> Self {
        let mut buff = vec![0u8; len];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        let token = buff
            .iter()
            .map(|b| TOKEN_ALPHABET[(b & 0x3f) as usize] as char)
            .collect();
        Self(token)
    }

    /// Compare a presented token against this one in constant time.
    ///
    /// Only the length of the candidate is allowed to leak through timing.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PublicToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Display for PublicToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
