//! OpenAPI documentation, served as JSON at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use streamvault_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StreamVault API",
        version = "0.1.0",
        description = "Video upload with synchronous derivation of lower-resolution tiers, quality-aware streaming with fallback to the original, and deletion of every stored artifact."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::video_get::list_videos,
        handlers::video_get::get_video,
        handlers::video_stream::stream_video,
        handlers::video_delete::delete_video,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::VideoResponse,
            handlers::video_get::VideoDetailResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video upload, retrieval, streaming and deletion"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;
