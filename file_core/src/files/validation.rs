use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("File is empty")]
    EmptyFile,

    #[error("File exceeds the maximum allowed size of {max_kb} KB")]
    FileTooLarge { size: u64, max_kb: u64 },

    #[error("Content type not allowed: {content_type}")]
    InvalidFileType { content_type: String },

    #[error("Filename too long: {length} characters (max: {max_length})")]
    FilenameTooLong { length: usize, max_length: usize },

    #[error("Invalid filename: {filename:?}")]
    InvalidFilename { filename: String },
}

#[derive(Debug, Clone)]
pub struct FileValidationConfig {
    pub max_file_size: u64,
    pub allowed_content_types: HashSet<String>,
    pub max_filename_length: usize,
}

impl FileValidationConfig {
    pub fn new<I, S>(max_file_size: u64, allowed_content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types.into_iter().map(Into::into).collect(),
            max_filename_length: 255,
        }
    }
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self::new(
            10 * 1024 * 1024,
            [
                "application/pdf",
                "image/png",
                "image/jpeg",
                "image/gif",
                "text/plain",
                "text/csv",
                "application/json",
                "application/zip",
            ],
        )
    }
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    config: FileValidationConfig,
}

impl FileValidator {
    pub fn new(config: FileValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(FileValidationConfig::default())
    }

    /// Checks a candidate upload. Runs before anything touches the disk or
    /// the database and never has side effects.
    pub fn validate_upload(&self, filename: &str, content_type: &str, data: &[u8]) -> Result<(), ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        if data.len() as u64 > self.config.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: data.len() as u64,
                max_kb: self.config.max_file_size / 1024,
            });
        }

        self.validate_filename(filename)?;

        self.validate_content_type(content_type)?;

        Ok(())
    }

    // The name becomes the on-disk filename, so it must stay a single path
    // component under the storage root.
    fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.len() > self.config.max_filename_length {
            return Err(ValidationError::FilenameTooLong {
                length: filename.len(),
                max_length: self.config.max_filename_length,
            });
        }

        let trimmed = filename.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || filename.contains('\0')
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(ValidationError::InvalidFilename {
                filename: filename.to_string(),
            });
        }

        Ok(())
    }

    fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if !self.config.allowed_content_types.contains(content_type) {
            return Err(ValidationError::InvalidFileType {
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }
}
