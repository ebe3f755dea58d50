//! Access control for shares
//!
//! The moving parts, smallest first:
//!
//! - **[`Permission`]**: the total order `None < Read < Write < Owner`,
//!   with [`GrantLevel`] (what can be granted) and [`Requirement`] (what
//!   an operation demands) on either side of it
//! - **[`DenyReason`]** and **[`AccessError`]**: the typed outcomes of a
//!   refused request
//! - **[`LoginRateLimiter`]**: fixed-window counters for password attempts
//! - **[`SessionStore`]**: where password elevation lives between requests
//! - **[`AccessGate`]**: the single entry point that ties them together
//!
//! Callers never compute permissions themselves; they hand credentials to
//! the gate and branch on the result.

mod error;
mod gate;
mod permission;
mod rate_limit;
mod session;

pub use error::{AccessError, DenyReason};
pub use gate::AccessGate;
pub use permission::{GrantLevel, InvalidPermission, Permission, Requirement};
pub use rate_limit::{login_throttle_key, LoginRateLimiter, ThrottleConfig};
pub use session::{share_password_key, MemorySession, SessionStore};
