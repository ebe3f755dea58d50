use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A file recorded under a share.
///
/// Only the record lives here. Content bytes are written and served by the
/// caller's storage layer; the record carries the stable path the content
/// was written under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    id: Uuid,
    share_id: Uuid,
    /// The user who uploaded the file.
    uploader_id: Uuid,
    /// Display name, also the final segment of the storage path.
    name: String,
    description: String,
    /// Content size in bytes, as reported at upload time.
    size: u64,
    /// Storage path: `<share_id>/<file_id>/<name>`. Fixed at creation so
    /// later renames never orphan the stored bytes.
    fs_path: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl FileEntry {
    pub fn new(
        share_id: Uuid,
        uploader_id: Uuid,
        name: String,
        description: String,
        size: u64,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let fs_path = format!("{}/{}/{}", share_id, id, name);
        Self {
            id,
            share_id,
            uploader_id,
            name,
            description,
            size,
            fs_path,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Rebuild a file entry from stored state.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        share_id: Uuid,
        uploader_id: Uuid,
        name: String,
        description: String,
        size: u64,
        fs_path: String,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
        deleted_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id,
            share_id,
            uploader_id,
            name,
            description,
            size,
            fs_path,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn share_id(&self) -> Uuid {
        self.share_id
    }

    pub fn uploader_id(&self) -> Uuid {
        self.uploader_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn fs_path(&self) -> &str {
        &self.fs_path
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Rename the file. The storage path is left alone.
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.touch();
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
        self.touch();
    }

    pub fn mark_deleted(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(OffsetDateTime::now_utc());
        }
    }

    fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fs_path_shape() {
        let share_id = Uuid::new_v4();
        let uploader = Uuid::new_v4();
        let file = FileEntry::new(
            share_id,
            uploader,
            "report.pdf".to_string(),
            "q3 numbers".to_string(),
            4096,
        );
        assert_eq!(
            file.fs_path(),
            format!("{}/{}/report.pdf", share_id, file.id())
        );
    }

    #[test]
    fn test_rename_keeps_fs_path() {
        let mut file = FileEntry::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "before.txt".to_string(),
            String::new(),
            1,
        );
        let path = file.fs_path().to_string();
        file.set_name("after.txt".to_string());
        assert_eq!(file.name(), "after.txt");
        assert_eq!(file.fs_path(), path);
    }
}
