//! Test helpers: build AppState and router for integration tests.
//!
//! Records live in the in-memory store and the encoder is replaced by [`CopyTranscoder`],
//! so these tests need neither Postgres nor ffmpeg.

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use streamvault_api::setup::routes;
use streamvault_api::state::AppState;
use streamvault_core::constants::API_PREFIX;
use streamvault_core::Config;
use streamvault_db::InMemoryVideoRepository;
use streamvault_processing::{TranscodeError, TranscodeOutcome, Transcoder, VideoPipeline};
use streamvault_storage::LocalStorage;
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/videos`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Copies the source to the output for every tier except the ones listed as failing,
/// which report a nonzero exit.
pub struct CopyTranscoder {
    failing: Vec<&'static str>,
}

impl CopyTranscoder {
    pub fn failing(tiers: &[&'static str]) -> Self {
        Self {
            failing: tiers.to_vec(),
        }
    }
}

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn invoke(
        &self,
        source_path: &Path,
        output_path: &Path,
        tier: &str,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        if self.failing.contains(&tier) {
            return Ok(TranscodeOutcome::Failed { exit_code: Some(1) });
        }
        tokio::fs::copy(source_path, output_path).await?;
        Ok(TranscodeOutcome::Succeeded)
    }
}

/// Test application: server, state and the temporary storage root.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    pub fn upload_dir(&self) -> &Path {
        &self.state.config.upload_dir
    }

    /// Every file currently under the storage root.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        files.sort();
        files
    }
}

/// 720p derives, 1080p fails, 1 MB upload limit.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(CopyTranscoder::failing(&["1080p"])).await
}

pub async fn setup_test_app_with(transcoder: CopyTranscoder) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let upload_dir = dir.path().join("videos");

    let vars: HashMap<&str, String> = HashMap::from([
        ("RECORD_STORE", "memory".to_string()),
        ("UPLOAD_DIR", upload_dir.display().to_string()),
        ("MAX_VIDEO_SIZE_MB", "1".to_string()),
        ("TRANSCODE_TIERS", "720p,1080p".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test config");
    config.validate().expect("Test config failed validation");

    let storage = LocalStorage::new(config.upload_dir.clone())
        .await
        .expect("Failed to create storage root");
    let repository = Arc::new(InMemoryVideoRepository::new());
    let pipeline =
        VideoPipeline::from_config(&config, storage, repository, Arc::new(transcoder));
    let state = Arc::new(AppState::new(config.clone(), pipeline));

    let app = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _dir: dir,
    }
}

/// Deterministic non-empty payload of `len` bytes.
pub fn video_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn upload_form(title: &str, data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name)
        .mime_type(mime_type);
    MultipartForm::new()
        .add_text("title", title)
        .add_part("file", part)
}

/// Upload a video and return the response body.
pub async fn upload_video(
    app: &TestApp,
    title: &str,
    data: Vec<u8>,
    file_name: &str,
    mime_type: &str,
) -> serde_json::Value {
    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(upload_form(title, data, file_name, mime_type))
        .await;
    assert_eq!(response.status_code(), 200, "upload failed: {}", response.text());
    response.json()
}
