//! Service wiring: record store, storage root, encoder and pipeline.

use crate::state::AppState;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use streamvault_core::Config;
use streamvault_db::create_video_repository;
use streamvault_processing::{FfmpegTranscoder, VideoPipeline};
use streamvault_storage::LocalStorage;

pub async fn initialize_services(config: &Config, pool: Option<PgPool>) -> Result<Arc<AppState>> {
    let repository =
        create_video_repository(config, pool).context("Failed to create video repository")?;

    let storage = LocalStorage::new(config.upload_dir.clone())
        .await
        .context("Failed to initialize video storage")?;

    let transcoder =
        FfmpegTranscoder::new(config.ffmpeg_path.clone()).context("Invalid FFMPEG_PATH")?;

    tracing::info!(
        upload_dir = %storage.base_path().display(),
        ffmpeg_path = %transcoder.ffmpeg_path(),
        tiers = ?config.transcode_tiers,
        max_concurrent_transcodes = config.max_concurrent_transcodes,
        "Video pipeline initialized"
    );

    let pipeline = VideoPipeline::from_config(config, storage, repository, Arc::new(transcoder));

    Ok(Arc::new(AppState::new(config.clone(), pipeline)))
}
