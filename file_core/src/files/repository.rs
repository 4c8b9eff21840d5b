use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::models::{FileListQuery, FileRecord};

const SELECT_COLUMNS: &str = "SELECT id, name, storage_path, content_type, size_bytes, uploaded_at, uploader_id, group_id, owner_tag FROM files_metadata";

#[async_trait]
pub trait FileRepositoryTrait: Send + Sync {
    async fn insert(&self, record: &FileRecord) -> Result<FileRecord>;
    async fn update(&self, record: &FileRecord) -> Result<FileRecord>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>>;
    async fn get_by_name(&self, name: &str) -> Result<Option<FileRecord>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list(&self, query: &FileListQuery) -> Result<Vec<FileRecord>>;
}

#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &SqliteRow) -> Result<FileRecord> {
        Ok(FileRecord {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::Database(format!("Invalid UUID: {}", e)))?,
            name: row.get("name"),
            storage_path: row.get("storage_path"),
            content_type: row.get("content_type"),
            size_bytes: row.get::<i64, _>("size_bytes") as u64,
            uploaded_at: DateTime::parse_from_rfc3339(&row.get::<String, _>("uploaded_at"))
                .map_err(|e| AppError::Database(format!("Invalid datetime: {}", e)))?
                .with_timezone(&Utc),
            uploader_id: row.get("uploader_id"),
            group_id: row.get("group_id"),
            owner_tag: row.get("owner_tag"),
        })
    }
}

#[async_trait]
impl FileRepositoryTrait for FileRepository {
    async fn insert(&self, record: &FileRecord) -> Result<FileRecord> {
        sqlx::query(
            r#"
            INSERT INTO files_metadata (id, name, storage_path, content_type, size_bytes, uploaded_at, uploader_id, group_id, owner_tag)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.name)
        .bind(&record.storage_path)
        .bind(&record.content_type)
        .bind(record.size_bytes as i64)
        .bind(record.uploaded_at.to_rfc3339())
        .bind(record.uploader_id)
        .bind(record.group_id)
        .bind(&record.owner_tag)
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }

    async fn update(&self, record: &FileRecord) -> Result<FileRecord> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE files_metadata
            SET name = ?2, storage_path = ?3, content_type = ?4, size_bytes = ?5,
                uploaded_at = ?6, uploader_id = ?7, group_id = ?8, owner_tag = ?9
            WHERE id = ?1
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.name)
        .bind(&record.storage_path)
        .bind(&record.content_type)
        .bind(record.size_bytes as i64)
        .bind(record.uploaded_at.to_rfc3339())
        .bind(record.uploader_id)
        .bind(record.group_id)
        .bind(&record.owner_tag)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("File not found with ID: {}", record.id)));
        }

        Ok(record.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!("{} WHERE name = ?1", SELECT_COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM files_metadata WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("File not found with ID: {}", id)));
        }

        Ok(())
    }

    async fn list(&self, query: &FileListQuery) -> Result<Vec<FileRecord>> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);

        if query.group.is_some() {
            sql.push_str(" AND group_id = ?");
        }

        if query.user.is_some() {
            sql.push_str(" AND uploader_id = ?");
        }

        sql.push_str(" ORDER BY rowid");

        let mut query_builder = sqlx::query(&sql);

        if let Some(group_id) = query.group {
            query_builder = query_builder.bind(group_id);
        }

        if let Some(uploader_id) = query.user {
            query_builder = query_builder.bind(uploader_id);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;

        rows.iter().map(Self::record_from_row).collect()
    }
}
