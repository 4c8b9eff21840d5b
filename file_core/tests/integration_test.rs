use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use file_core::{
    config::{AppConfig, DatabaseConfig, StorageConfig},
    create_app_with_config,
    files::FileListQuery,
    AppError, AppState, FileCandidate,
};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_test_system(temp_dir: &TempDir) -> (AppState, AppConfig) {
    let config = AppConfig {
        database: DatabaseConfig {
            url: format!("sqlite:{}", temp_dir.path().join("files.db").display()),
            ..DatabaseConfig::default()
        },
        storage: StorageConfig {
            root_dir: temp_dir.path().join("uploads"),
            max_file_size_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec!["application/pdf".to_string(), "image/png".to_string()],
        },
        ..AppConfig::default()
    };

    let state = AppState::from_config(&config).await.unwrap();
    (state, config)
}

#[tokio::test]
async fn test_bootstrap_creates_storage_root() {
    let temp_dir = TempDir::new().unwrap();
    let (state, _config) = setup_test_system(&temp_dir).await;

    assert!(temp_dir.path().join("uploads").is_dir());
    assert!(temp_dir.path().join("files.db").exists());
    state.db_manager.health_check().await.unwrap();
}

#[tokio::test]
async fn test_report_lifecycle_through_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let (state, _config) = setup_test_system(&temp_dir).await;
    let store = &state.file_store;

    let first = store
        .store(FileCandidate::new("report.pdf", "application/pdf", vec![b'a'; 2048]))
        .await
        .unwrap();
    assert_eq!(first.size_bytes, 2048);

    let second = store
        .store(FileCandidate::new("report.pdf", "application/pdf", vec![b'b'; 4096]))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.size_bytes, 4096);

    let (record, bytes) = store.fetch_bytes(first.id).await.unwrap();
    assert_eq!(record.size_bytes, 4096);
    assert_eq!(bytes.len(), 4096);
    assert!(bytes.iter().all(|b| *b == b'b'));

    assert_eq!(store.list(&FileListQuery::default()).await.unwrap().len(), 1);

    store.delete(first.id).await.unwrap();
    assert!(matches!(store.fetch_metadata(first.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(store.fetch_bytes(first.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_report_lifecycle_over_http() {
    let temp_dir = TempDir::new().unwrap();
    let (state, config) = setup_test_system(&temp_dir).await;
    let app = create_app_with_config(state, &config);

    let upload = |len: usize, fill: u8| {
        let boundary = "lifecycle-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"group\"\r\n\r\n4\r\n");
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(&vec![fill; len]);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/files/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    };

    let response = app.clone().oneshot(upload(2048, 1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(first["size_bytes"], 2048);
    let id = first["id"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(upload(4096, 2)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let second: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(second["id"], id.as_str());
    assert_eq!(second["size_bytes"], 4096);

    let download = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/files/{}/download", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(download).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.len(), 4096);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/files/{}/delete", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let metadata = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/files/{}/metadata", id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(metadata).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(error["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let (state, config) = setup_test_system(&temp_dir).await;
    let app = create_app_with_config(state, &config);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
