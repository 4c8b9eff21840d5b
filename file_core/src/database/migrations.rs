use sqlx::{SqlitePool, Row};
use tracing::{info, error};
use crate::error::{AppError, Result};

pub struct MigrationManager {
    pool: SqlitePool,
}

impl MigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Starting database migrations");

        self.create_migrations_table().await?;

        let current_version = self.get_current_version().await?;
        info!("Current migration version: {}", current_version);

        let mut applied_count = 0;

        for migration in Self::migrations() {
            if migration.version > current_version {
                info!("Applying migration {}: {}", migration.version, migration.name);
                self.apply_migration(&migration).await?;
                applied_count += 1;
            }
        }

        if applied_count > 0 {
            info!("Applied {} migrations successfully", applied_count);
        } else {
            info!("No new migrations to apply");
        }

        Ok(())
    }

    pub async fn current_version(&self) -> Result<i64> {
        self.get_current_version().await
    }

    async fn create_migrations_table(&self) -> Result<()> {
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                checksum TEXT NOT NULL
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn get_current_version(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COALESCE(MAX(version), 0) as version FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.try_get("version").unwrap_or(0))
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        for &statement in migration.sql_statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Failed to execute migration statement: {}", e);
                    AppError::from(e)
                })?;
        }

        sqlx::query(r#"
            INSERT INTO _migrations (version, name, checksum)
            VALUES (?, ?, ?)
        "#)
        .bind(migration.version)
        .bind(migration.name)
        .bind(migration.checksum)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }

    fn migrations() -> Vec<Migration> {
        vec![
            Migration {
                version: 1,
                name: "create_files_metadata_table",
                checksum: "files_metadata_v1",
                sql_statements: &[
                    r#"
                    CREATE TABLE files_metadata (
                        id TEXT PRIMARY KEY,
                        name TEXT NOT NULL,
                        storage_path TEXT NOT NULL,
                        content_type TEXT NOT NULL,
                        size_bytes INTEGER NOT NULL,
                        uploaded_at TEXT NOT NULL
                    )
                    "#,
                    "CREATE UNIQUE INDEX idx_files_metadata_name ON files_metadata(name)",
                ],
            },
            Migration {
                version: 2,
                name: "add_classification_columns",
                checksum: "files_metadata_v2",
                sql_statements: &[
                    "ALTER TABLE files_metadata ADD COLUMN uploader_id INTEGER",
                    "ALTER TABLE files_metadata ADD COLUMN group_id INTEGER",
                    "ALTER TABLE files_metadata ADD COLUMN owner_tag TEXT",
                    "CREATE INDEX idx_files_metadata_group_id ON files_metadata(group_id)",
                ],
            },
        ]
    }
}

struct Migration {
    version: i64,
    name: &'static str,
    checksum: &'static str,
    sql_statements: &'static [&'static str],
}

pub async fn run_migrations(pool: SqlitePool) -> Result<()> {
    MigrationManager::new(pool).run_migrations().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let database_url = format!("sqlite:{}", temp_file.path().display());
        let pool = SqlitePool::connect(&database_url).await.unwrap();

        let manager = MigrationManager::new(pool.clone());
        manager.run_migrations().await.unwrap();
        manager.run_migrations().await.unwrap();

        assert_eq!(manager.current_version().await.unwrap(), 2);

        let columns: Vec<String> = sqlx::query("SELECT name FROM pragma_table_info('files_metadata')")
            .fetch_all(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();

        for expected in ["id", "name", "size_bytes", "uploader_id", "group_id", "owner_tag"] {
            assert!(columns.contains(&expected.to_string()), "missing column {}", expected);
        }
    }
}
