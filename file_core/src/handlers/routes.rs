//! Route table for the file service

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::AppState;
use super::{files, health};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/files", get(files::list_files))
        .route("/api/files/upload", post(files::upload_file))
        .route("/api/files/:id/metadata", get(files::get_file_metadata))
        .route("/api/files/:id/download", get(files::download_file))
        .route("/api/files/:id/delete", delete(files::delete_file))
}
