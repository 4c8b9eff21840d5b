pub mod models;
pub mod repository;
pub mod store;
pub mod validation;

pub use models::{FileCandidate, FileListQuery, FileMetadata, FileRecord};
pub use repository::{FileRepository, FileRepositoryTrait};
pub use store::{FileStore, FileStoreConfig};
pub use validation::{FileValidationConfig, FileValidator, ValidationError};
