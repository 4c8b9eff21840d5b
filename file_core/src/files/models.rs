use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted description of one stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub uploader_id: Option<i64>,
    pub group_id: Option<i64>,
    pub owner_tag: Option<String>,
}

/// Client-facing view of a [`FileRecord`]; the on-disk path stays private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub uploader_id: Option<i64>,
    pub group_id: Option<i64>,
    pub owner_tag: Option<String>,
}

impl From<FileRecord> for FileMetadata {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            content_type: record.content_type,
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
            uploader_id: record.uploader_id,
            group_id: record.group_id,
            owner_tag: record.owner_tag,
        }
    }
}

/// An incoming payload, prior to validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub uploader_id: Option<i64>,
    pub group_id: Option<i64>,
    pub owner_tag: Option<String>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
            uploader_id: None,
            group_id: None,
            owner_tag: None,
        }
    }

    pub fn with_uploader(mut self, uploader_id: i64) -> Self {
        self.uploader_id = Some(uploader_id);
        self
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_owner_tag(mut self, owner_tag: impl Into<String>) -> Self {
        self.owner_tag = Some(owner_tag.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListQuery {
    pub group: Option<i64>,
    pub user: Option<i64>,
}

impl FileListQuery {
    pub fn by_group(group_id: i64) -> Self {
        Self {
            group: Some(group_id),
            ..Default::default()
        }
    }
}
