use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

/// The closed set of recorded events.
///
/// `FileUpdate` is reserved for callers that rename or re-describe files;
/// the core operations emit the other seven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    ShareCreate,
    ShareUpdate,
    ShareDelete,
    ShareAccessChange,
    FileCreate,
    FileUpdate,
    FileDelete,
    FileDownload,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::ShareCreate => "share_create",
            AuditKind::ShareUpdate => "share_update",
            AuditKind::ShareDelete => "share_delete",
            AuditKind::ShareAccessChange => "share_access_change",
            AuditKind::FileCreate => "file_create",
            AuditKind::FileUpdate => "file_update",
            AuditKind::FileDelete => "file_delete",
            AuditKind::FileDownload => "file_download",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditKind {
    type Err = InvalidAuditKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "share_create" => Ok(AuditKind::ShareCreate),
            "share_update" => Ok(AuditKind::ShareUpdate),
            "share_delete" => Ok(AuditKind::ShareDelete),
            "share_access_change" => Ok(AuditKind::ShareAccessChange),
            "file_create" => Ok(AuditKind::FileCreate),
            "file_update" => Ok(AuditKind::FileUpdate),
            "file_delete" => Ok(AuditKind::FileDelete),
            "file_download" => Ok(AuditKind::FileDownload),
            _ => Err(InvalidAuditKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audit kind: {0}")]
pub struct InvalidAuditKind(pub String);

/// One immutable line of a share's history.
///
/// Entries are written in the same unit of work as the mutation they
/// describe and are never updated or deleted afterwards. An anonymous
/// actor (`None`) means the action came through the public token path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub share_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    /// The acting user, if any. Token-path downloads have no actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Uuid>,
    pub kind: AuditKind,
    /// Free-form context for display. Opaque to the core.
    pub details: serde_json::Value,
}

impl AuditEntry {
    /// Start an entry stamped with the current time.
    pub fn new(share_id: Uuid, kind: AuditKind, actor: Option<Uuid>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            share_id,
            file_id: None,
            actor,
            kind,
            details: json!({}),
        }
    }

    pub fn with_file(mut self, file_id: Uuid) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Rebuild an entry from stored state.
    pub fn restore(
        timestamp: OffsetDateTime,
        share_id: Uuid,
        file_id: Option<Uuid>,
        actor: Option<Uuid>,
        kind: AuditKind,
        details: serde_json::Value,
    ) -> Self {
        Self {
            timestamp,
            share_id,
            file_id,
            actor,
            kind,
            details,
        }
    }
}
