use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use streamvault_core::constants::{API_PREFIX, ORIGINAL_QUALITY};
use streamvault_core::{VideoRecord, VideoResponse};
use utoipa::ToSchema;
use uuid::Uuid;

/// A video together with the stream URL of every quality it can be played in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoDetailResponse {
    pub video: VideoResponse,
    /// Quality label to stream URL, `original` always present
    pub available_qualities: BTreeMap<String, String>,
}

fn stream_url(id: Uuid, quality: &str) -> String {
    if quality == ORIGINAL_QUALITY {
        format!("{}/videos/{}/stream", API_PREFIX, id)
    } else {
        format!("{}/videos/{}/stream?quality={}", API_PREFIX, id, quality)
    }
}

impl From<VideoRecord> for VideoDetailResponse {
    fn from(record: VideoRecord) -> Self {
        let available_qualities = record
            .available_qualities()
            .into_iter()
            .map(|quality| {
                let url = stream_url(record.id, &quality);
                (quality, url)
            })
            .collect();

        Self {
            video: record.into(),
            available_qualities,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "All videos, newest first", body = Vec<VideoResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let videos = state.pipeline.list_videos().await?;
    let responses: Vec<VideoResponse> = videos.into_iter().map(VideoResponse::from).collect();
    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoDetailResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state.pipeline.get_video(id).await?;
    Ok(Json(VideoDetailResponse::from(video)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use streamvault_core::QualityTier;

    #[test]
    fn test_detail_lists_stream_url_per_quality() {
        let mut record = VideoRecord {
            id: Uuid::nil(),
            title: "Demo".to_string(),
            original_file_name: Some("clip.mp4".to_string()),
            content_type: "video/mp4".to_string(),
            file_size_bytes: 1,
            uploaded_at: chrono::Utc::now(),
            original_path: PathBuf::from("/data/abc.mp4"),
            derived_paths: BTreeMap::new(),
        };
        record.insert_derived(QualityTier::Hd720, PathBuf::from("/data/abc_720p.mp4"));

        let detail = VideoDetailResponse::from(record);

        let id = Uuid::nil();
        assert_eq!(detail.available_qualities.len(), 2);
        assert_eq!(
            detail.available_qualities["original"],
            format!("/api/videos/{}/stream", id)
        );
        assert_eq!(
            detail.available_qualities["720p"],
            format!("/api/videos/{}/stream?quality=720p", id)
        );
        assert_eq!(detail.video.available_qualities, vec!["original", "720p"]);
    }
}
