use std::fmt::{Debug, Display};

use async_trait::async_trait;
use uuid::Uuid;

use crate::share::{AuditEntry, FileEntry, Share};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareStoreError<T> {
    #[error("unhandled share store provider error: {0}")]
    Provider(#[from] T),
    /// The target of a mutation does not exist or is already deleted.
    #[error("share store record not found")]
    NotFound,
}

/// Persistence for shares, their files, and their audit trail.
///
/// Every mutation takes the [`AuditEntry`] describing it and must commit
/// the record change and the entry as one unit: neither lands without the
/// other. A silently dropped audit entry is a correctness bug, not a
/// logging gap.
///
/// Lookups never return soft-deleted records, and the access-filtered
/// lookups return `None` for shares that exist but are not reachable by
/// the given user. Callers cannot tell the two cases apart.
#[async_trait]
pub trait ShareStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug;

    /// Persist a new share together with its `share_create` entry.
    ///
    /// Ids are caller-generated v4 UUIDs; the store does not allocate them.
    async fn insert_share(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Persist updated share metadata (name, description, token, password).
    ///
    /// Grants are written by [`ShareStore::replace_grants`], not here.
    ///
    /// # Returns
    /// * `Err(ShareStoreError::NotFound)` - The share is missing or deleted
    async fn update_share(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Soft-delete a share. The record is hidden from every lookup from
    /// then on; its audit entries remain readable.
    async fn delete_share(
        &self,
        share_id: Uuid,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Replace the persisted grant set with the one carried by `share`.
    async fn replace_grants(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Persist a new file record under its share.
    ///
    /// # Returns
    /// * `Err(ShareStoreError::NotFound)` - The share is missing or deleted
    async fn insert_file(
        &self,
        file: &FileEntry,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Soft-delete a file record. `share_id` must match the file's share.
    async fn delete_file(
        &self,
        share_id: Uuid,
        file_id: Uuid,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>>;

    /// Append a lone audit entry, outside any record mutation. Used for
    /// download events.
    async fn append_audit(&self, entry: AuditEntry)
        -> Result<(), ShareStoreError<Self::Error>>;

    /// Fetch a share by id, with grants loaded.
    async fn share(&self, share_id: Uuid) -> Result<Option<Share>, ShareStoreError<Self::Error>>;

    /// Fetch a share by id only if it currently has a public token.
    ///
    /// The token itself is compared by the caller, in constant time; this
    /// lookup just restricts the candidate set.
    async fn public_share(
        &self,
        share_id: Uuid,
    ) -> Result<Option<Share>, ShareStoreError<Self::Error>>;

    /// Fetch a share by id only if `user` is its owner or holds a grant.
    ///
    /// # Returns
    /// * `Ok(Some(share))` - The share, with grants loaded
    /// * `Ok(None)` - The share is missing, deleted, or not reachable by
    ///   this user; callers cannot tell which
    async fn share_accessible_to(
        &self,
        share_id: Uuid,
        user: Uuid,
    ) -> Result<Option<Share>, ShareStoreError<Self::Error>>;

    /// List every share `user` can reach through identity, owned shares
    /// included.
    async fn shares_accessible_to(
        &self,
        user: Uuid,
    ) -> Result<Vec<Share>, ShareStoreError<Self::Error>>;

    /// Fetch a file by id under the given share.
    async fn file(
        &self,
        share_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<FileEntry>, ShareStoreError<Self::Error>>;

    /// List the live files under a share.
    async fn files(&self, share_id: Uuid)
        -> Result<Vec<FileEntry>, ShareStoreError<Self::Error>>;

    /// List a share's audit entries, newest first. Entries survive the
    /// deletion of the share they describe.
    async fn audit_entries(
        &self,
        share_id: Uuid,
    ) -> Result<Vec<AuditEntry>, ShareStoreError<Self::Error>>;
}
