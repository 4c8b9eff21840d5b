use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::files::{FileStoreConfig, FileValidationConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./files.db".to_string(),
            max_connections: 10,
            connection_timeout_seconds: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let validation = FileValidationConfig::default();
        let mut allowed_content_types: Vec<String> =
            validation.allowed_content_types.into_iter().collect();
        allowed_content_types.sort();

        Self {
            root_dir: PathBuf::from("./uploads"),
            max_file_size_bytes: validation.max_file_size,
            allowed_content_types,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl StorageConfig {
    pub fn file_store_config(&self) -> FileStoreConfig {
        FileStoreConfig {
            storage_root: self.root_dir.clone(),
            validation: FileValidationConfig::new(
                self.max_file_size_bytes,
                self.allowed_content_types.iter().cloned(),
            ),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_environment(Self::environment())
    }

    /// Environment overrides use `APP_<SECTION>__<KEY>`, e.g.
    /// `APP_STORAGE__ROOT_DIR` or `APP_STORAGE__ALLOWED_CONTENT_TYPES=a/b,c/d`.
    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("storage.allowed_content_types")
            .with_list_parse_key("cors.allowed_origins")
            .try_parsing(true)
    }

    fn load_with_environment(environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(environment);

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max connections must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_file_size_bytes == 0 {
            return Err(ConfigError::Message(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if self.storage.allowed_content_types.is_empty() {
            return Err(ConfigError::Message(
                "At least one content type must be allowed".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:./files.db");
        assert_eq!(config.storage.max_file_size_bytes, 10 * 1024 * 1024);
        assert!(config
            .storage
            .allowed_content_types
            .contains(&"application/pdf".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.max_file_size_bytes = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.allowed_content_types.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_environment_overrides() {
        let mut vars = HashMap::new();
        vars.insert("APP_SERVER__PORT".to_string(), "8081".to_string());
        vars.insert("APP_STORAGE__ROOT_DIR".to_string(), "/srv/files".to_string());
        vars.insert("APP_STORAGE__MAX_FILE_SIZE_BYTES".to_string(), "2048".to_string());
        vars.insert(
            "APP_STORAGE__ALLOWED_CONTENT_TYPES".to_string(),
            "application/pdf,image/png".to_string(),
        );

        let config = AppConfig::load_with_environment(AppConfig::environment().source(Some(vars)))
            .expect("Should load configuration");

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.storage.root_dir, PathBuf::from("/srv/files"));
        assert_eq!(config.storage.max_file_size_bytes, 2048);
        assert_eq!(
            config.storage.allowed_content_types,
            vec!["application/pdf".to_string(), "image/png".to_string()]
        );
        assert_eq!(config.database.url, "sqlite:./files.db");
    }

    #[test]
    fn test_file_store_config_from_storage_section() {
        let storage = StorageConfig {
            root_dir: PathBuf::from("/tmp/uploads"),
            max_file_size_bytes: 4096,
            allowed_content_types: vec!["image/png".to_string()],
        };

        let store_config = storage.file_store_config();
        assert_eq!(store_config.storage_root, PathBuf::from("/tmp/uploads"));
        assert_eq!(store_config.validation.max_file_size, 4096);
        assert!(store_config.validation.allowed_content_types.contains("image/png"));
        assert_eq!(store_config.validation.allowed_content_types.len(), 1);
    }
}
