//! Cryptographic primitives for Cubby
//!
//! Two small concerns live here:
//!
//! - **Public tokens**: capability strings that grant read access to a
//!   single share. Generated from a CSPRNG over a 64-symbol URL-safe
//!   alphabet and compared in constant time.
//! - **Share passwords**: salted Argon2id hashes in PHC string format.
//!   Verification of a plaintext attempt and equality of stored hash
//!   strings are separate operations with separate call sites.
//!
//! Neither type ever holds a plaintext password at rest.

mod password;
mod token;

pub use password::{PasswordHash, PasswordHashError};
pub use token::{PublicToken, TOKEN_ALPHABET, TOKEN_LENGTH};
