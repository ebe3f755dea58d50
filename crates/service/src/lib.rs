//! SQLite-backed persistence and share operations for Cubby.
//!
//! This crate carries everything a server or CLI embedding the
//! access-control core needs:
//! - Database (SQLite with the ShareStore implementation)
//! - State management (database handle + access gate)
//! - Share operations (create/update/delete, grants, files, logins)
//! - Process setup (tracing, panic hook)

pub mod config;
pub mod database;
pub mod process;
pub mod shares;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use database::{Database, DatabaseSetupError};
pub use shares::{PasswordChange, ShareDraft, ShareOpError, ShareUpdate};
pub use state::{State as ServiceState, StateSetupError};
