//! File Store: keeps each payload on disk and its metadata row in step.
//!
//! Overwrites delete the old bytes before writing the new ones and deletes
//! remove the file before the row. Neither pair is atomic; a crash in between
//! leaves a record without a file, which [`FileStore::fetch_bytes`] reports
//! as not found.

use std::path::{Path, PathBuf};
use chrono::Utc;
use uuid::Uuid;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use super::models::{FileCandidate, FileListQuery, FileRecord};
use super::repository::{FileRepository, FileRepositoryTrait};
use super::validation::{FileValidationConfig, FileValidator, ValidationError};

#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    pub storage_root: PathBuf,
    pub validation: FileValidationConfig,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("uploads"),
            validation: FileValidationConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct FileStore {
    config: FileStoreConfig,
    repository: FileRepository,
    validator: FileValidator,
}

impl FileStore {
    pub fn new(config: FileStoreConfig, repository: FileRepository) -> Self {
        let validator = FileValidator::new(config.validation.clone());

        Self {
            config,
            repository,
            validator,
        }
    }

    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    pub async fn initialize(&self) -> Result<()> {
        self.ensure_storage_root().await
    }

    pub fn validate(&self, candidate: &FileCandidate) -> std::result::Result<(), ValidationError> {
        self.validator
            .validate_upload(&candidate.name, &candidate.content_type, &candidate.data)
    }

    /// Validates and writes `candidate`, replacing any file already stored
    /// under the same name. A replaced file keeps its record id.
    pub async fn store(&self, candidate: FileCandidate) -> Result<FileRecord> {
        self.validate(&candidate)?;

        self.ensure_storage_root().await?;

        let path = self.storage_path_for(&candidate.name);

        let existing = if async_fs::try_exists(&path).await.map_err(storage_error)? {
            let record = self
                .repository
                .get_by_name(&candidate.name)
                .await
                .map_err(AppError::into_storage)?
                .ok_or_else(|| {
                    warn!("File {} exists on disk without a metadata record", path.display());
                    AppError::NotFound(format!(
                        "No metadata record found for stored file: {}",
                        candidate.name
                    ))
                })?;

            async_fs::remove_file(&path).await.map_err(storage_error)?;
            Some(record)
        } else {
            let orphan = self
                .repository
                .get_by_name(&candidate.name)
                .await
                .map_err(AppError::into_storage)?;

            if let Some(record) = &orphan {
                warn!("Reusing record {} whose file {} is missing", record.id, path.display());
            }
            orphan
        };

        let mut file = async_fs::File::create(&path).await.map_err(storage_error)?;
        file.write_all(&candidate.data).await.map_err(storage_error)?;
        file.sync_all().await.map_err(storage_error)?;

        let size_bytes = candidate.size();
        let uploaded_at = Utc::now();

        let persisted = match existing {
            Some(mut record) => {
                record.storage_path = path.to_string_lossy().to_string();
                record.content_type = candidate.content_type;
                record.size_bytes = size_bytes;
                record.uploaded_at = uploaded_at;
                if candidate.uploader_id.is_some() {
                    record.uploader_id = candidate.uploader_id;
                }
                if candidate.group_id.is_some() {
                    record.group_id = candidate.group_id;
                }
                if candidate.owner_tag.is_some() {
                    record.owner_tag = candidate.owner_tag;
                }

                let updated = self.repository.update(&record).await.map_err(AppError::into_storage)?;
                info!("Replaced file {} ({} bytes) as {}", updated.name, updated.size_bytes, updated.id);
                updated
            }
            None => {
                let record = FileRecord {
                    id: Uuid::new_v4(),
                    name: candidate.name,
                    storage_path: path.to_string_lossy().to_string(),
                    content_type: candidate.content_type,
                    size_bytes,
                    uploaded_at,
                    uploader_id: candidate.uploader_id,
                    group_id: candidate.group_id,
                    owner_tag: candidate.owner_tag,
                };

                let created = self.repository.insert(&record).await.map_err(AppError::into_storage)?;
                info!("Stored file {} ({} bytes) as {}", created.name, created.size_bytes, created.id);
                created
            }
        };

        Ok(persisted)
    }

    pub async fn fetch_metadata(&self, id: Uuid) -> Result<FileRecord> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File not found with ID: {}", id)))
    }

    pub async fn fetch_bytes(&self, id: Uuid) -> Result<(FileRecord, Vec<u8>)> {
        let record = self.fetch_metadata(id).await?;
        let path = Path::new(&record.storage_path);

        if !async_fs::try_exists(path).await? {
            warn!("Metadata record {} points at missing file {}", record.id, record.storage_path);
            return Err(AppError::NotFound(format!(
                "File {} is missing from storage",
                record.name
            )));
        }

        let data = async_fs::read(path).await.map_err(|e| {
            tracing::error!("Failed to read file {}: {}", record.storage_path, e);
            AppError::IoError(e)
        })?;

        Ok((record, data))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let record = self.fetch_metadata(id).await?;
        let path = Path::new(&record.storage_path);

        if async_fs::try_exists(path).await.map_err(storage_error)? {
            async_fs::remove_file(path).await.map_err(|e| {
                tracing::error!("Failed to delete file {}: {}", record.storage_path, e);
                storage_error(e)
            })?;
        } else {
            warn!("Deleting record {} whose file {} is already gone", record.id, record.storage_path);
        }

        self.repository.delete(id).await.map_err(AppError::into_storage)?;
        info!("Deleted file {} ({})", record.name, record.id);

        Ok(())
    }

    pub async fn list(&self, query: &FileListQuery) -> Result<Vec<FileRecord>> {
        self.repository.list(query).await
    }

    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<FileRecord>> {
        self.list(&FileListQuery::by_group(group_id)).await
    }

    async fn ensure_storage_root(&self) -> Result<()> {
        async_fs::create_dir_all(&self.config.storage_root)
            .await
            .map_err(storage_error)
    }

    fn storage_path_for(&self, name: &str) -> PathBuf {
        self.config.storage_root.join(name)
    }
}

fn storage_error(err: std::io::Error) -> AppError {
    AppError::Storage(err.to_string())
}
