//! Share operations
//!
//! The service-level entry points for working with shares. Every operation
//! authorizes through the [`AccessGate`](common::access::AccessGate) first,
//! then applies the mutation and its audit entry through the store in one
//! unit.
//!
//! File content is the caller's concern; the operations only fix the
//! ordering. On create, content must be written before the record commits.
//! On delete, the record commits before content removal runs. Content I/O
//! never happens inside a store transaction.

use std::future::Future;

use common::access::{AccessError, DenyReason, GrantLevel, Requirement, SessionStore};
use common::crypto::{PasswordHash, PasswordHashError};
use common::share::{AuditEntry, AuditKind, FileEntry, Share};
use common::share_store::{ShareStore, ShareStoreError};
use serde_json::json;
use uuid::Uuid;

use crate::state::State;

#[derive(Debug, thiserror::Error)]
pub enum ShareOpError {
    #[error("access error: {0}")]
    Access(#[from] AccessError<sqlx::Error>),

    #[error("share store error: {0}")]
    Store(#[from] ShareStoreError<sqlx::Error>),

    #[error("file not found")]
    FileNotFound,

    #[error("password hashing error: {0}")]
    Password(#[from] PasswordHashError),

    #[error("content storage error: {0}")]
    Content(#[source] anyhow::Error),
}

impl ShareOpError {
    /// The deny reason, if this error is an access refusal.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            ShareOpError::Access(err) => err.deny_reason(),
            _ => None,
        }
    }
}

/// Parameters for creating a share.
#[derive(Debug, Clone, Default)]
pub struct ShareDraft {
    pub name: String,
    pub description: String,
    /// Enable the public link and generate its token.
    pub public: bool,
    /// Plaintext password to hash and set, if the share is to be gated.
    pub password: Option<String>,
}

/// Parameters for updating a share's metadata.
#[derive(Debug, Clone)]
pub struct ShareUpdate {
    pub name: String,
    pub description: String,
    /// Desired public-link state. Turning the link off discards the token;
    /// turning it back on later generates a fresh one.
    pub public: bool,
    pub password: PasswordChange,
}

/// What to do with the share password on update.
///
/// An update form that says nothing about the password must not clear it,
/// so "no change" is its own case rather than an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PasswordChange {
    /// Leave the stored hash as it is.
    #[default]
    Keep,
    /// Remove the password gate.
    Clear,
    /// Hash the given plaintext and store it.
    Set(String),
}

/// Create a share owned by `owner` and record `share_create`.
pub async fn create_share(
    state: &State,
    owner: Uuid,
    draft: ShareDraft,
) -> Result<Share, ShareOpError> {
    let mut share = Share::new(owner, draft.name, draft.description);
    if draft.public {
        share.enable_public_link();
    }
    if let Some(password) = draft.password.as_deref() {
        share.set_password(Some(PasswordHash::new(password)?));
    }

    let entry = AuditEntry::new(share.id(), AuditKind::ShareCreate, Some(owner))
        .with_details(json!({ "name": share.name() }));
    state.database().insert_share(&share, entry).await?;

    tracing::info!(share_id = %share.id(), owner_id = %owner, "share created");
    Ok(share)
}

/// Update a share's metadata. Owner only.
pub async fn update_share(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
    update: ShareUpdate,
) -> Result<Share, ShareOpError> {
    let mut share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Owner, false)
        .await?;

    share.set_name(update.name);
    share.set_description(update.description);
    if update.public {
        share.enable_public_link();
    } else {
        share.disable_public_link();
    }
    match update.password {
        PasswordChange::Keep => {}
        PasswordChange::Clear => share.set_password(None),
        PasswordChange::Set(password) => {
            share.set_password(Some(PasswordHash::new(&password)?));
        }
    }

    let entry = AuditEntry::new(share.id(), AuditKind::ShareUpdate, Some(actor))
        .with_details(json!({ "name": share.name() }));
    state.database().update_share(&share, entry).await?;

    tracing::info!(share_id = %share.id(), "share updated");
    Ok(share)
}

/// Soft-delete a share. Owner only. The audit trail stays readable.
pub async fn delete_share(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
) -> Result<(), ShareOpError> {
    let share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Owner, false)
        .await?;

    let entry = AuditEntry::new(share.id(), AuditKind::ShareDelete, Some(actor))
        .with_details(json!({ "name": share.name() }));
    state.database().delete_share(share.id(), entry).await?;

    tracing::info!(share_id = %share.id(), "share deleted");
    Ok(())
}

/// Replace the share's grant set. Owner only.
///
/// Grants for the owner are dropped; revoked users disappear from the set,
/// and everyone else ends up at exactly the level given here.
pub async fn set_share_access(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
    grants: impl IntoIterator<Item = (Uuid, GrantLevel)>,
) -> Result<Share, ShareOpError> {
    let mut share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Owner, false)
        .await?;

    share.replace_grants(grants);

    let entry = AuditEntry::new(share.id(), AuditKind::ShareAccessChange, Some(actor))
        .with_details(json!({ "grants": share.grants().len() }));
    state.database().replace_grants(&share, entry).await?;

    tracing::info!(share_id = %share.id(), grants = share.grants().len(), "share access changed");
    Ok(share)
}

/// Add a file record to a share. Requires `write`.
///
/// `store_content` runs after authorization and before the record commits;
/// if it fails, nothing is persisted.
pub async fn add_file<F, Fut>(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
    name: String,
    description: String,
    size: u64,
    store_content: F,
) -> Result<FileEntry, ShareOpError>
where
    F: FnOnce(FileEntry) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Write, false)
        .await?;

    let file = FileEntry::new(share.id(), actor, name, description, size);

    store_content(file.clone())
        .await
        .map_err(ShareOpError::Content)?;

    let entry = AuditEntry::new(share.id(), AuditKind::FileCreate, Some(actor))
        .with_file(file.id())
        .with_details(json!({ "name": file.name(), "size": file.size() }));
    state.database().insert_file(&file, entry).await?;

    tracing::info!(share_id = %share.id(), file_id = %file.id(), "file added");
    Ok(file)
}

/// Soft-delete a file record. Requires `write`.
///
/// `remove_content` runs after the record change committed, so a failure
/// there leaves stray bytes rather than a live record without content.
pub async fn remove_file<F, Fut>(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
    file_id: Uuid,
    remove_content: F,
) -> Result<(), ShareOpError>
where
    F: FnOnce(FileEntry) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Write, false)
        .await?;

    let file = state
        .database()
        .file(share.id(), file_id)
        .await?
        .ok_or(ShareOpError::FileNotFound)?;

    let entry = AuditEntry::new(share.id(), AuditKind::FileDelete, Some(actor))
        .with_file(file.id())
        .with_details(json!({ "name": file.name() }));
    state.database().delete_file(share.id(), file.id(), entry).await?;

    tracing::info!(share_id = %share.id(), file_id = %file.id(), "file removed");

    remove_content(file).await.map_err(ShareOpError::Content)?;
    Ok(())
}

/// Resolve a file for download and record `file_download`.
///
/// Token and identity paths both land here; a token-path download has no
/// actor in its audit entry. The caller serves the bytes from the
/// returned record's `fs_path`.
pub async fn download_file(
    state: &State,
    session: &dyn SessionStore,
    share_id: Uuid,
    file_id: Uuid,
    public_token: Option<&str>,
    user: Option<Uuid>,
) -> Result<FileEntry, ShareOpError> {
    let share = state
        .gate()
        .authorize_share(session, share_id, public_token, user, Requirement::Read, false)
        .await?;

    let file = state
        .database()
        .file(share.id(), file_id)
        .await?
        .ok_or(ShareOpError::FileNotFound)?;

    let entry = AuditEntry::new(share.id(), AuditKind::FileDownload, user)
        .with_file(file.id())
        .with_details(json!({ "name": file.name() }));
    state.database().append_audit(entry).await?;

    tracing::debug!(share_id = %share.id(), file_id = %file.id(), "file download recorded");
    Ok(file)
}

/// Fetch a share and its live files for display. Requires `read`.
pub async fn view_share(
    state: &State,
    session: &dyn SessionStore,
    share_id: Uuid,
    public_token: Option<&str>,
    user: Option<Uuid>,
) -> Result<(Share, Vec<FileEntry>), ShareOpError> {
    let share = state
        .gate()
        .authorize_share(session, share_id, public_token, user, Requirement::Read, false)
        .await?;

    let files = state.database().files(share.id()).await?;
    Ok((share, files))
}

/// Authorize showing the password entry screen for a share.
pub async fn view_share_login(
    state: &State,
    share_id: Uuid,
    public_token: Option<&str>,
    user: Option<Uuid>,
) -> Result<Share, ShareOpError> {
    Ok(state
        .gate()
        .view_share_login(share_id, public_token, user)
        .await?)
}

/// Attempt the share password and elevate the session on success.
pub async fn share_login(
    state: &State,
    session: &dyn SessionStore,
    share_id: Uuid,
    password: &str,
    client_ip: &str,
) -> Result<Share, ShareOpError> {
    Ok(state
        .gate()
        .share_login(session, share_id, password, client_ip)
        .await?)
}

/// List a share's audit entries, newest first. Owner only.
pub async fn share_audit_log(
    state: &State,
    session: &dyn SessionStore,
    actor: Uuid,
    share_id: Uuid,
) -> Result<Vec<AuditEntry>, ShareOpError> {
    let share = state
        .gate()
        .authorize_share(session, share_id, None, Some(actor), Requirement::Owner, false)
        .await?;

    Ok(state.database().audit_entries(share.id()).await?)
}

/// List every share `user` owns or holds a grant on.
pub async fn accessible_shares(state: &State, user: Uuid) -> Result<Vec<Share>, ShareOpError> {
    Ok(state.database().shares_accessible_to(user).await?)
}
