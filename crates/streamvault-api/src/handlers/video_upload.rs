use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;
use streamvault_core::{AppError, VideoResponse};
use streamvault_processing::UploadSource;

const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

struct UploadedFile {
    data: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
}

/// Collect the `title` and `file` fields. Unknown fields are skipped.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<UploadedFile>), HttpAppError> {
    let mut title = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = Some(field.text().await?),
            Some("file") => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    )
                    .into());
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some(UploadedFile {
                    data,
                    file_name,
                    content_type,
                });
            }
            _ => {}
        }
    }

    Ok((title, file))
}

#[utoipa::path(
    post,
    path = "/api/videos/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "`title` text field and `file` video part"),
    responses(
        (status = 200, description = "Video stored and derived", body = VideoResponse),
        (status = 400, description = "Missing field, empty file, bad title or non-video type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage, encoder or database failure", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (title, file) = read_upload_form(multipart).await?;
    let title = title.ok_or_else(|| AppError::InvalidInput("Title is required".to_string()))?;
    let file = file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    tracing::info!(
        title = %title,
        file_name = ?file.file_name,
        size_bytes = file.data.len(),
        "Received video upload"
    );

    let source = UploadSource {
        declared_size: Some(file.data.len() as u64),
        content_type: file
            .content_type
            .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string()),
        original_file_name: file.file_name,
        reader: Box::pin(Cursor::new(file.data)),
    };

    let video = state.pipeline.upload_and_derive(&title, source).await?;
    Ok(Json(VideoResponse::from(video)))
}
