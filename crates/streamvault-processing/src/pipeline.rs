//! Upload, retrieval and deletion of videos.
//!
//! An upload either returns a record whose original is fully stored, or fails leaving
//! neither a record nor files behind. Encoder failures only reduce the set of derived tiers.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use streamvault_core::{AppError, Config, NewVideo, VideoRecord};
use streamvault_db::VideoRepository;
use streamvault_storage::{LocalStorage, StorageAllocation, StorageError};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use crate::validator::{sanitize_filename, UploadValidator};
use crate::video::resolver::{self, ResolvedArtifact};
use crate::video::{DerivationOrchestrator, Transcoder};

/// An incoming upload as handed over by the HTTP layer.
pub struct UploadSource {
    pub reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    /// Size announced by the client, checked before any byte is stored.
    pub declared_size: Option<u64>,
    pub content_type: String,
    pub original_file_name: Option<String>,
}

#[derive(Clone)]
pub struct VideoPipeline {
    storage: LocalStorage,
    repository: Arc<dyn VideoRepository>,
    orchestrator: DerivationOrchestrator,
    validator: UploadValidator,
}

impl VideoPipeline {
    pub fn new(
        storage: LocalStorage,
        repository: Arc<dyn VideoRepository>,
        orchestrator: DerivationOrchestrator,
        validator: UploadValidator,
    ) -> Self {
        Self {
            storage,
            repository,
            orchestrator,
            validator,
        }
    }

    /// Wire a pipeline from configuration: tiers, concurrency and size limit.
    pub fn from_config(
        config: &Config,
        storage: LocalStorage,
        repository: Arc<dyn VideoRepository>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let orchestrator = DerivationOrchestrator::new(
            transcoder,
            repository.clone(),
            config.transcode_tiers.clone(),
            config.max_concurrent_transcodes,
        );
        let validator = UploadValidator::new(config.max_video_size_bytes as u64);
        Self::new(storage, repository, orchestrator, validator)
    }

    /// Store an upload, create its record and derive every configured tier.
    #[tracing::instrument(skip(self, source), fields(content_type = %source.content_type))]
    pub async fn upload_and_derive(
        &self,
        title: &str,
        source: UploadSource,
    ) -> Result<VideoRecord, AppError> {
        let title = self.validator.validate_title(title)?;
        let content_type = self.validator.validate_content_type(&source.content_type)?;
        if let Some(declared) = source.declared_size {
            self.validator.validate_file_size(declared)?;
        }
        let original_file_name = sanitize_filename(source.original_file_name.as_deref());

        // One byte past the limit is enough to tell an oversized upload apart.
        let limited = source.reader.take(self.validator.max_file_size() + 1);
        let stored = self
            .storage
            .store_original(original_file_name.as_deref(), Box::pin(limited))
            .await?;
        let original_path = stored.path();

        if let Err(e) = self.validator.validate_file_size(stored.bytes_written) {
            self.discard(&original_path).await;
            return Err(e.into());
        }

        let file_size_bytes = match i64::try_from(stored.bytes_written) {
            Ok(size) => size,
            Err(_) => {
                self.discard(&original_path).await;
                return Err(AppError::PayloadTooLarge("File size out of range".to_string()));
            }
        };

        let new_video = NewVideo {
            title,
            original_file_name,
            content_type,
            file_size_bytes,
            original_path: original_path.clone(),
        };

        let record = match self.repository.create(new_video).await {
            Ok(record) => record,
            Err(e) => {
                self.discard(&original_path).await;
                return Err(e);
            }
        };

        tracing::info!(
            video_id = %record.id,
            size_bytes = file_size_bytes,
            path = %original_path.display(),
            "Original stored"
        );

        match self.orchestrator.derive(record.clone(), &original_path).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!(
                    video_id = %record.id,
                    error = %e,
                    "Derivation failed, rolling back upload"
                );
                self.roll_back(&record, &stored.allocation).await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>, AppError> {
        self.repository.list_by_uploaded_desc().await
    }

    pub async fn get_video(&self, id: Uuid) -> Result<VideoRecord, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    /// Artifact to serve for `quality`, falling back to the original.
    #[tracing::instrument(skip(self), fields(video_id = %id))]
    pub async fn get_file(
        &self,
        id: Uuid,
        quality: Option<&str>,
    ) -> Result<ResolvedArtifact, AppError> {
        let record = self.get_video(id).await?;
        Ok(resolver::resolve(&record, quality))
    }

    /// Open a resolved artifact for streaming. A file missing from disk is `NotFound`.
    pub async fn open_artifact(&self, artifact: &ResolvedArtifact) -> Result<(File, u64), AppError> {
        self.storage.open(&artifact.path).await.map_err(|e| match e {
            StorageError::NotFound(_) => {
                tracing::warn!(path = %artifact.path.display(), "Artifact missing from storage");
                AppError::NotFound("Video file not found".to_string())
            }
            other => other.into(),
        })
    }

    /// Delete every artifact of a video, then its record. Unknown ids are a no-op.
    #[tracing::instrument(skip(self), fields(video_id = %id))]
    pub async fn delete_video(&self, id: Uuid) -> Result<(), AppError> {
        match self.repository.find_by_id(id).await? {
            Some(record) => self.purge(&record).await,
            None => {
                tracing::debug!("Video already absent, nothing to delete");
                Ok(())
            }
        }
    }

    /// Remove the original and every derived file, then the record.
    ///
    /// Missing files are fine. Any other file error keeps the record so a retry still knows
    /// what is left to remove; every file is attempted before reporting.
    pub async fn purge(&self, record: &VideoRecord) -> Result<(), AppError> {
        let mut failures = Vec::new();
        for path in record.artifact_paths() {
            if let Err(e) = self.storage.remove_if_exists(path).await {
                tracing::error!(
                    video_id = %record.id,
                    path = %path.display(),
                    error = %e,
                    "Failed to delete video artifact"
                );
                failures.push(e.to_string());
            }
        }

        if !failures.is_empty() {
            return Err(AppError::Storage(failures.join("; ")));
        }

        self.repository.delete(record.id).await?;
        tracing::info!(video_id = %record.id, "Video deleted");
        Ok(())
    }

    async fn discard(&self, path: &Path) {
        if let Err(e) = self.storage.remove_if_exists(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to discard stored original");
        }
    }

    /// Best-effort removal of everything an aborted upload created.
    async fn roll_back(&self, record: &VideoRecord, allocation: &StorageAllocation) {
        let derived: Vec<PathBuf> = self
            .orchestrator
            .tiers()
            .iter()
            .map(|tier| allocation.derived_path(*tier))
            .collect();

        for path in derived.iter().map(PathBuf::as_path).chain(record.artifact_paths()) {
            self.discard(path).await;
        }

        if let Err(e) = self.repository.delete(record.id).await {
            tracing::warn!(video_id = %record.id, error = %e, "Failed to delete record during rollback");
        }
    }
}
