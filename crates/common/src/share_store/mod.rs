//! Share persistence
//!
//! [`ShareStore`] is the seam between the access-control core and whatever
//! actually holds the records. The contract that matters: every mutation
//! carries its [`AuditEntry`](crate::share::AuditEntry) and commits record
//! plus entry as one unit.
//!
//! [`MemoryShareStore`] is the reference implementation; the SQLite-backed
//! one lives with the service layer.

mod memory;
mod provider;

pub use memory::{MemoryShareStore, MemoryShareStoreError};
pub use provider::{ShareStore, ShareStoreError};
