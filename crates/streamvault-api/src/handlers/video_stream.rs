use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use streamvault_core::AppError;
use tokio_util::io::ReaderStream;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Derived tier label such as `720p`; omitted, unknown or not derived serves the original
    pub quality: Option<String>,
}

/// `inline; filename="..."`, or a bare `inline` when the name is not a valid header value.
fn content_disposition(file_name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("inline; filename=\"{}\"", file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}/stream",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        StreamQuery
    ),
    responses(
        (status = 200, description = "Video file", content_type = "video/*"),
        (status = 404, description = "Video or its file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, HttpAppError> {
    let artifact = state
        .pipeline
        .get_file(id, query.quality.as_deref())
        .await?;
    let (file, size) = state.pipeline.open_artifact(&artifact).await?;

    tracing::debug!(
        video_id = %id,
        path = %artifact.path.display(),
        tier = ?artifact.tier,
        size_bytes = size,
        "Streaming video artifact"
    );

    let content_type = HeaderValue::from_str(&artifact.content_type)
        .map_err(|e| AppError::Internal(format!("Invalid stored content type: {}", e)))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.file_name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build stream response: {}", e)))?;

    Ok(response)
}
