use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::provider::{ShareStore, ShareStoreError};
use crate::share::{AuditEntry, FileEntry, Share};

/// In-memory share store using HashMaps
///
/// Backs unit tests and embedded use. Mutation plus audit append happen
/// under one write lock, so the atomicity contract holds trivially.
#[derive(Debug, Clone)]
pub struct MemoryShareStore {
    inner: Arc<RwLock<MemoryShareStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryShareStoreInner {
    /// Shares by id, grants held inline. Soft-deleted shares stay here
    /// with their marker set.
    shares: HashMap<Uuid, Share>,
    /// File records by file id.
    files: HashMap<Uuid, FileEntry>,
    /// Audit entries in append order.
    audit: Vec<AuditEntry>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryShareStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryShareStoreInner::default())),
        }
    }
}

impl Default for MemoryShareStore {
    fn default() -> Self {
        Self::new()
    }
}

type MemoryResult<T> = Result<T, ShareStoreError<MemoryShareStoreError>>;

impl MemoryShareStore {
    fn read(&self) -> MemoryResult<std::sync::RwLockReadGuard<'_, MemoryShareStoreInner>> {
        self.inner.read().map_err(|e| {
            ShareStoreError::Provider(MemoryShareStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write(&self) -> MemoryResult<std::sync::RwLockWriteGuard<'_, MemoryShareStoreInner>> {
        self.inner.write().map_err(|e| {
            ShareStoreError::Provider(MemoryShareStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    type Error = MemoryShareStoreError;

    async fn insert_share(&self, share: &Share, entry: AuditEntry) -> MemoryResult<()> {
        let mut inner = self.write()?;
        inner.shares.insert(share.id(), share.clone());
        inner.audit.push(entry);
        Ok(())
    }

    async fn update_share(&self, share: &Share, entry: AuditEntry) -> MemoryResult<()> {
        let mut inner = self.write()?;
        match inner.shares.get(&share.id()) {
            Some(stored) if !stored.is_deleted() => {}
            _ => return Err(ShareStoreError::NotFound),
        }
        inner.shares.insert(share.id(), share.clone());
        inner.audit.push(entry);
        Ok(())
    }

    async fn delete_share(&self, share_id: Uuid, entry: AuditEntry) -> MemoryResult<()> {
        let mut inner = self.write()?;
        match inner.shares.get_mut(&share_id) {
            Some(stored) if !stored.is_deleted() => stored.mark_deleted(),
            _ => return Err(ShareStoreError::NotFound),
        }
        inner.audit.push(entry);
        Ok(())
    }

    async fn replace_grants(&self, share: &Share, entry: AuditEntry) -> MemoryResult<()> {
        // the record carries the full desired grant set
        self.update_share(share, entry).await
    }

    async fn insert_file(&self, file: &FileEntry, entry: AuditEntry) -> MemoryResult<()> {
        let mut inner = self.write()?;
        match inner.shares.get(&file.share_id()) {
            Some(stored) if !stored.is_deleted() => {}
            _ => return Err(ShareStoreError::NotFound),
        }
        inner.files.insert(file.id(), file.clone());
        inner.audit.push(entry);
        Ok(())
    }

    async fn delete_file(
        &self,
        share_id: Uuid,
        file_id: Uuid,
        entry: AuditEntry,
    ) -> MemoryResult<()> {
        let mut inner = self.write()?;
        match inner.files.get_mut(&file_id) {
            Some(file) if file.share_id() == share_id && !file.is_deleted() => {
                file.mark_deleted()
            }
            _ => return Err(ShareStoreError::NotFound),
        }
        inner.audit.push(entry);
        Ok(())
    }

    async fn append_audit(&self, entry: AuditEntry) -> MemoryResult<()> {
        let mut inner = self.write()?;
        inner.audit.push(entry);
        Ok(())
    }

    async fn share(&self, share_id: Uuid) -> MemoryResult<Option<Share>> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .get(&share_id)
            .filter(|s| !s.is_deleted())
            .cloned())
    }

    async fn public_share(&self, share_id: Uuid) -> MemoryResult<Option<Share>> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .get(&share_id)
            .filter(|s| !s.is_deleted() && s.is_public())
            .cloned())
    }

    async fn share_accessible_to(&self, share_id: Uuid, user: Uuid) -> MemoryResult<Option<Share>> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .get(&share_id)
            .filter(|s| !s.is_deleted() && s.is_accessible_by(user))
            .cloned())
    }

    async fn shares_accessible_to(&self, user: Uuid) -> MemoryResult<Vec<Share>> {
        let inner = self.read()?;
        let mut shares: Vec<Share> = inner
            .shares
            .values()
            .filter(|s| !s.is_deleted() && s.is_accessible_by(user))
            .cloned()
            .collect();
        shares.sort_by_key(|s| s.created_at());
        Ok(shares)
    }

    async fn file(&self, share_id: Uuid, file_id: Uuid) -> MemoryResult<Option<FileEntry>> {
        let inner = self.read()?;
        Ok(inner
            .files
            .get(&file_id)
            .filter(|f| f.share_id() == share_id && !f.is_deleted())
            .cloned())
    }

    async fn files(&self, share_id: Uuid) -> MemoryResult<Vec<FileEntry>> {
        let inner = self.read()?;
        let mut files: Vec<FileEntry> = inner
            .files
            .values()
            .filter(|f| f.share_id() == share_id && !f.is_deleted())
            .cloned()
            .collect();
        files.sort_by_key(|f| f.created_at());
        Ok(files)
    }

    async fn audit_entries(&self, share_id: Uuid) -> MemoryResult<Vec<AuditEntry>> {
        let inner = self.read()?;
        // reverse append order first so equal timestamps stay newest-first
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .rev()
            .filter(|e| e.share_id == share_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
