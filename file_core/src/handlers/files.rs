use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection,
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum::extract::multipart::Field;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    files::{FileCandidate, FileListQuery, FileMetadata},
    AppState,
};

/// Optional classification fields sent next to the `file` part.
#[derive(Debug, Default, Validate)]
struct UploadFields {
    #[validate(range(min = 1, message = "User id must be a positive number"))]
    user: Option<i64>,

    #[validate(range(min = 1, message = "Group id must be a positive number"))]
    group: Option<i64>,

    #[validate(length(min = 1, max = 64, message = "Tag must be between 1 and 64 characters"))]
    tag: Option<String>,
}

struct UploadedFile {
    name: String,
    content_type: String,
    data: Vec<u8>,
}

// Authorization hook: uploads, downloads and deletes are open to any caller.

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FileMetadata>> {
    let mut multipart = multipart?;
    let mut uploaded: Option<UploadedFile> = None;
    let mut fields = UploadFields::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| AppError::Validation("Missing filename".to_string()))?
                    .to_string();

                let content_type = match field.content_type() {
                    Some(content_type) => content_type.to_string(),
                    None => mime_guess::from_path(&filename)
                        .first_or_octet_stream()
                        .to_string(),
                };

                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file data: {}", e))
                })?;

                uploaded = Some(UploadedFile {
                    name: filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "user" => fields.user = Some(parse_id_field("user", field).await?),
            "group" => fields.group = Some(parse_id_field("group", field).await?),
            "tag" => fields.tag = Some(read_text_field("tag", field).await?),
            _ => {}
        }
    }

    fields
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid upload fields: {}", e)))?;

    let uploaded = uploaded.ok_or_else(|| {
        AppError::Validation("No file found in request".to_string())
    })?;

    let mut candidate = FileCandidate::new(uploaded.name, uploaded.content_type, uploaded.data);
    candidate.uploader_id = fields.user;
    candidate.group_id = fields.group;
    candidate.owner_tag = fields.tag;

    let record = state.file_store.store(candidate).await?;

    Ok(Json(record.into()))
}

pub async fn get_file_metadata(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileMetadata>> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.file_store.fetch_metadata(file_id).await?;

    Ok(Json(record.into()))
}

pub async fn list_files(
    State(state): State<AppState>,
    query: std::result::Result<Query<FileListQuery>, QueryRejection>,
) -> Result<Json<Vec<FileMetadata>>> {
    let Query(query) = query?;
    let records = state.file_store.list(&query).await?;

    Ok(Json(records.into_iter().map(FileMetadata::from).collect()))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response> {
    let file_id = parse_file_id(&file_id)?;
    let (record, data) = state.file_store.fetch_bytes(file_id).await?;

    let mut headers = HeaderMap::new();

    let content_type = record
        .content_type
        .parse::<mime::Mime>()
        .ok()
        .and_then(|mime| HeaderValue::from_str(mime.as_ref()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(data.len()));

    let disposition = format!(
        "attachment; filename=\"{}\"",
        record.name.replace('"', "\\\"")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_bytes(disposition.as_bytes())
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((StatusCode::OK, headers, data).into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode> {
    let file_id = parse_file_id(&file_id)?;
    state.file_store.delete(file_id).await?;
    info!("File {} deleted", file_id);

    Ok(StatusCode::NO_CONTENT)
}

// An id that cannot exist is reported the same way as one that does not.
fn parse_file_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("File not found with ID: {}", raw)))
}

async fn read_text_field(name: &str, field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e| AppError::Validation(format!("Failed to read field '{}': {}", name, e)))
}

async fn parse_id_field(name: &str, field: Field<'_>) -> Result<i64> {
    let text = read_text_field(name, field).await?;
    text.parse::<i64>().map_err(|_| {
        AppError::Validation(format!("Invalid value for field '{}': {}", name, text))
    })
}
