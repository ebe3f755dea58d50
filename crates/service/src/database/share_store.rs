//! [`ShareStore`] implementation on the SQLite pool.
//!
//! Every mutation runs in one transaction together with the audit entry
//! describing it. Reads hydrate domain records from row structs and load
//! grants with a second query.

use async_trait::async_trait;
use common::crypto::{PasswordHash, PublicToken};
use common::share::{AuditEntry, FileEntry, Grants, Share};
use common::share_store::{ShareStore, ShareStoreError};
use sqlx::{FromRow, Sqlite, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::database::types::{DAuditKind, DGrantLevel, DUuid};
use crate::database::Database;

#[derive(Debug, FromRow)]
struct ShareRow {
    id: DUuid,
    owner_id: DUuid,
    name: String,
    description: String,
    public_token: Option<String>,
    password: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl ShareRow {
    fn into_share(self, grants: Grants) -> Share {
        Share::restore(
            self.id.into(),
            self.owner_id.into(),
            self.name,
            self.description,
            self.public_token.map(PublicToken::from),
            self.password.map(PasswordHash::from),
            grants,
            self.created_at,
            self.updated_at,
            self.deleted_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    user_id: DUuid,
    permission: DGrantLevel,
}

#[derive(Debug, FromRow)]
struct FileRow {
    id: DUuid,
    share_id: DUuid,
    uploader_id: DUuid,
    name: String,
    description: String,
    size: i64,
    fs_path: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl FileRow {
    fn into_file(self) -> FileEntry {
        FileEntry::restore(
            self.id.into(),
            self.share_id.into(),
            self.uploader_id.into(),
            self.name,
            self.description,
            self.size as u64,
            self.fs_path,
            self.created_at,
            self.updated_at,
            self.deleted_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    timestamp: OffsetDateTime,
    share_id: DUuid,
    file_id: Option<DUuid>,
    actor_id: Option<DUuid>,
    kind: DAuditKind,
    details: String,
}

impl AuditRow {
    fn into_entry(self) -> Result<AuditEntry, sqlx::Error> {
        let details = serde_json::from_str(&self.details)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(AuditEntry::restore(
            self.timestamp,
            self.share_id.into(),
            self.file_id.map(Uuid::from),
            self.actor_id.map(Uuid::from),
            self.kind.into(),
            details,
        ))
    }
}

async fn append_audit_tx(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &AuditEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO share_audit_logs (timestamp, share_id, file_id, actor_id, kind, details)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(entry.timestamp)
    .bind(DUuid::from(entry.share_id))
    .bind(entry.file_id.map(DUuid::from))
    .bind(entry.actor.map(DUuid::from))
    .bind(DAuditKind::from(entry.kind))
    .bind(entry.details.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl Database {
    async fn share_grants(&self, share_id: DUuid) -> Result<Grants, sqlx::Error> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT user_id, permission
            FROM share_user_access
            WHERE share_id = ?1
            "#,
        )
        .bind(share_id)
        .fetch_all(&**self)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.user_id.into(), row.permission.into()))
            .collect())
    }

    async fn hydrate_share(&self, row: Option<ShareRow>) -> Result<Option<Share>, sqlx::Error> {
        match row {
            Some(row) => {
                let grants = self.share_grants(row.id).await?;
                Ok(Some(row.into_share(grants)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ShareStore for Database {
    type Error = sqlx::Error;

    async fn insert_share(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO shares (
                id, owner_id, name, description, public_token, password,
                created_at, updated_at, deleted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(DUuid::from(share.id()))
        .bind(DUuid::from(share.owner_id()))
        .bind(share.name())
        .bind(share.description())
        .bind(share.public_token().map(|token| token.as_str()))
        .bind(share.password().map(|hash| hash.as_str()))
        .bind(share.created_at())
        .bind(share.updated_at())
        .bind(share.deleted_at())
        .execute(&mut *tx)
        .await?;

        for (user, level) in share.grants() {
            sqlx::query(
                r#"
                INSERT INTO share_user_access (share_id, user_id, permission)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(DUuid::from(share.id()))
            .bind(DUuid::from(*user))
            .bind(DGrantLevel::from(*level))
            .execute(&mut *tx)
            .await?;
        }

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn update_share(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE shares
            SET name = ?2, description = ?3, public_token = ?4, password = ?5,
                updated_at = ?6
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share.id()))
        .bind(share.name())
        .bind(share.description())
        .bind(share.public_token().map(|token| token.as_str()))
        .bind(share.password().map(|hash| hash.as_str()))
        .bind(share.updated_at())
        .execute(&mut *tx)
        .await?;

        // dropping the transaction rolls the update back
        if updated.rows_affected() == 0 {
            return Err(ShareStoreError::NotFound);
        }

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn delete_share(
        &self,
        share_id: Uuid,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        let deleted = sqlx::query(
            r#"
            UPDATE shares
            SET deleted_at = ?2, updated_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share_id))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(ShareStoreError::NotFound);
        }

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn replace_grants(
        &self,
        share: &Share,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let mut tx = self.begin().await?;

        let touched = sqlx::query(
            r#"
            UPDATE shares
            SET updated_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share.id()))
        .bind(share.updated_at())
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(ShareStoreError::NotFound);
        }

        sqlx::query(
            r#"
            DELETE FROM share_user_access
            WHERE share_id = ?1
            "#,
        )
        .bind(DUuid::from(share.id()))
        .execute(&mut *tx)
        .await?;

        for (user, level) in share.grants() {
            sqlx::query(
                r#"
                INSERT INTO share_user_access (share_id, user_id, permission)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(DUuid::from(share.id()))
            .bind(DUuid::from(*user))
            .bind(DGrantLevel::from(*level))
            .execute(&mut *tx)
            .await?;
        }

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn insert_file(
        &self,
        file: &FileEntry,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let mut tx = self.begin().await?;

        let live = sqlx::query(
            r#"
            SELECT id FROM shares
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(file.share_id()))
        .fetch_optional(&mut *tx)
        .await?;

        if live.is_none() {
            return Err(ShareStoreError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO files (
                id, share_id, uploader_id, name, description, size, fs_path,
                created_at, updated_at, deleted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(DUuid::from(file.id()))
        .bind(DUuid::from(file.share_id()))
        .bind(DUuid::from(file.uploader_id()))
        .bind(file.name())
        .bind(file.description())
        .bind(file.size() as i64)
        .bind(file.fs_path())
        .bind(file.created_at())
        .bind(file.updated_at())
        .bind(file.deleted_at())
        .execute(&mut *tx)
        .await?;

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn delete_file(
        &self,
        share_id: Uuid,
        file_id: Uuid,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        let deleted = sqlx::query(
            r#"
            UPDATE files
            SET deleted_at = ?3, updated_at = ?3
            WHERE share_id = ?1 AND id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share_id))
        .bind(DUuid::from(file_id))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(ShareStoreError::NotFound);
        }

        append_audit_tx(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn append_audit(
        &self,
        entry: AuditEntry,
    ) -> Result<(), ShareStoreError<Self::Error>> {
        sqlx::query(
            r#"
            INSERT INTO share_audit_logs (timestamp, share_id, file_id, actor_id, kind, details)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(entry.timestamp)
        .bind(DUuid::from(entry.share_id))
        .bind(entry.file_id.map(DUuid::from))
        .bind(entry.actor.map(DUuid::from))
        .bind(DAuditKind::from(entry.kind))
        .bind(entry.details.to_string())
        .execute(&**self)
        .await?;

        Ok(())
    }

    async fn share(&self, share_id: Uuid) -> Result<Option<Share>, ShareStoreError<Self::Error>> {
        let row = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT id, owner_id, name, description, public_token, password,
                   created_at, updated_at, deleted_at
            FROM shares
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share_id))
        .fetch_optional(&**self)
        .await?;

        Ok(self.hydrate_share(row).await?)
    }

    async fn public_share(
        &self,
        share_id: Uuid,
    ) -> Result<Option<Share>, ShareStoreError<Self::Error>> {
        let row = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT id, owner_id, name, description, public_token, password,
                   created_at, updated_at, deleted_at
            FROM shares
            WHERE id = ?1 AND deleted_at IS NULL AND public_token IS NOT NULL
            "#,
        )
        .bind(DUuid::from(share_id))
        .fetch_optional(&**self)
        .await?;

        Ok(self.hydrate_share(row).await?)
    }

    async fn share_accessible_to(
        &self,
        share_id: Uuid,
        user: Uuid,
    ) -> Result<Option<Share>, ShareStoreError<Self::Error>> {
        let row = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT id, owner_id, name, description, public_token, password,
                   created_at, updated_at, deleted_at
            FROM shares
            WHERE id = ?1 AND deleted_at IS NULL
              AND (
                  owner_id = ?2
                  OR EXISTS (
                      SELECT 1 FROM share_user_access
                      WHERE share_user_access.share_id = shares.id
                        AND share_user_access.user_id = ?2
                  )
              )
            "#,
        )
        .bind(DUuid::from(share_id))
        .bind(DUuid::from(user))
        .fetch_optional(&**self)
        .await?;

        Ok(self.hydrate_share(row).await?)
    }

    async fn shares_accessible_to(
        &self,
        user: Uuid,
    ) -> Result<Vec<Share>, ShareStoreError<Self::Error>> {
        let rows = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT id, owner_id, name, description, public_token, password,
                   created_at, updated_at, deleted_at
            FROM shares
            WHERE deleted_at IS NULL
              AND (
                  owner_id = ?1
                  OR EXISTS (
                      SELECT 1 FROM share_user_access
                      WHERE share_user_access.share_id = shares.id
                        AND share_user_access.user_id = ?1
                  )
              )
            ORDER BY created_at ASC
            "#,
        )
        .bind(DUuid::from(user))
        .fetch_all(&**self)
        .await?;

        let mut shares = Vec::with_capacity(rows.len());
        for row in rows {
            let grants = self.share_grants(row.id).await?;
            shares.push(row.into_share(grants));
        }

        Ok(shares)
    }

    async fn file(
        &self,
        share_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<FileEntry>, ShareStoreError<Self::Error>> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, share_id, uploader_id, name, description, size, fs_path,
                   created_at, updated_at, deleted_at
            FROM files
            WHERE share_id = ?1 AND id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(DUuid::from(share_id))
        .bind(DUuid::from(file_id))
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(FileRow::into_file))
    }

    async fn files(
        &self,
        share_id: Uuid,
    ) -> Result<Vec<FileEntry>, ShareStoreError<Self::Error>> {
        let rows = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, share_id, uploader_id, name, description, size, fs_path,
                   created_at, updated_at, deleted_at
            FROM files
            WHERE share_id = ?1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(DUuid::from(share_id))
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(FileRow::into_file).collect())
    }

    async fn audit_entries(
        &self,
        share_id: Uuid,
    ) -> Result<Vec<AuditEntry>, ShareStoreError<Self::Error>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT timestamp, share_id, file_id, actor_id, kind, details
            FROM share_audit_logs
            WHERE share_id = ?1
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(DUuid::from(share_id))
        .fetch_all(&**self)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(row.into_entry()?);
        }

        Ok(entries)
    }
}
