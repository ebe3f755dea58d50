use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::share_store::ShareStoreError;

/// Why the gate refused a request it could attribute to a share.
///
/// A closed set so callers can branch on the outcome (prompt for the share
/// password, show the login screen, render a 403) without matching on
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Neither an identity nor a public token was presented.
    MissingCredentials,
    /// A public token was presented and does not match the share's.
    PublicTokenIncorrect,
    /// The share password was never entered, was wrong, or has rotated
    /// since it was entered.
    InvalidSharePassword,
    /// The caller reached the share but holds too low a permission level.
    MissingPermission,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MissingCredentials => "missing_credentials",
            DenyReason::PublicTokenIncorrect => "public_token_incorrect",
            DenyReason::InvalidSharePassword => "invalid_share_password",
            DenyReason::MissingPermission => "missing_permission",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of an access decision, generic over the store provider's error.
#[derive(Debug, thiserror::Error)]
pub enum AccessError<T> {
    #[error("unhandled share store error: {0}")]
    Store(#[from] ShareStoreError<T>),
    /// The share does not exist, is deleted, or is simply not visible to
    /// this caller. Callers cannot tell the three cases apart.
    #[error("share not found")]
    NotFound,
    /// The share was reached but the request was refused.
    #[error("access denied ({reason}): {message}")]
    Denied { reason: DenyReason, message: String },
    /// Too many password attempts for this share from this client.
    #[error("too many login attempts, retry in {}s", available_in.as_secs())]
    RateLimited { available_in: Duration },
}

impl<T> AccessError<T> {
    pub(crate) fn denied(reason: DenyReason, message: impl Into<String>) -> Self {
        AccessError::Denied {
            reason,
            message: message.into(),
        }
    }

    /// The deny reason, when the request was understood but refused.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            AccessError::Denied { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
