/**
 * Access control for shares.
 *  - Permission levels and the resolver over them
 *  - The access gate (token, grant, and password paths)
 *  - Login rate limiting and session elevation
 */
pub mod access;
/**
 * Cryptographic types and operations.
 *  - Public token generation and comparison
 *  - Password hashing and verification
 */
pub mod crypto;
/**
 * Core records for a share.
 * Describes a share, the files under it, and the
 *  audit entries recorded against it.
 */
pub mod share;
/**
 * Storage abstraction for shares.
 *  Providers persist shares, grants, files, and
 *  audit entries as one unit per mutation.
 */
pub mod share_store;

pub mod testkit;

pub mod prelude {
    pub use crate::access::{AccessError, AccessGate, DenyReason, Permission, Requirement};
    pub use crate::crypto::{PasswordHash, PublicToken};
    pub use crate::share::{AuditEntry, AuditKind, FileEntry, Share};
    pub use crate::share_store::{ShareStore, ShareStoreError};
}
