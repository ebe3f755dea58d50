//! Share records and their history
//!
//! The core types persisted by a share store:
//!
//! - **[`Share`]**: the root record, carrying its own access-control state
//!   (owner, grants map, public token, password hash)
//! - **[`FileEntry`]**: a file recorded under a share; content bytes live
//!   with the caller's storage layer
//! - **[`AuditEntry`]**: one immutable line of the share's history, written
//!   atomically with the mutation it describes
//!
//! Records use private fields with accessor and mutator methods, so every
//! state change flows through a place that can keep the invariants (owner
//! never in the grants map, token rotation on re-enable, fixed fs paths).

mod audit;
mod file;
mod share;

pub use audit::{AuditEntry, AuditKind, InvalidAuditKind};
pub use file::FileEntry;
pub use share::{Grants, Share};
