//! Per-tier derivation of an uploaded original.
//!
//! Each configured tier is encoded as its own task, at most `max_concurrent` at a time.
//! A failed encode only leaves its tier out. Successful tiers are committed to the record
//! store one at a time as they finish, so readers only ever see a growing set of tiers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use streamvault_core::{AppError, QualityTier, VideoRecord};
use streamvault_db::VideoRepository;
use streamvault_storage::StorageAllocation;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;

use super::transcoder::{TranscodeError, TranscodeOutcome, Transcoder};

#[derive(Clone)]
pub struct DerivationOrchestrator {
    transcoder: Arc<dyn Transcoder>,
    repository: Arc<dyn VideoRepository>,
    tiers: Vec<QualityTier>,
    max_concurrent: usize,
}

impl DerivationOrchestrator {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        repository: Arc<dyn VideoRepository>,
        tiers: Vec<QualityTier>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            transcoder,
            repository,
            tiers,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn tiers(&self) -> &[QualityTier] {
        &self.tiers
    }

    /// Encode every configured tier from `source_path` and return the updated record.
    ///
    /// Encoder failures never fail this call. Launch, storage and record store errors do,
    /// but only after every started tier has finished; the first such error is returned.
    #[tracing::instrument(skip(self, record, source_path), fields(video_id = %record.id))]
    pub async fn derive(
        &self,
        record: VideoRecord,
        source_path: &Path,
    ) -> Result<VideoRecord, AppError> {
        let allocation = StorageAllocation::from_original_path(source_path)?;
        let record = Arc::new(Mutex::new(record));
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for tier in self.tiers.iter().copied() {
            let job = TierJob {
                transcoder: self.transcoder.clone(),
                repository: self.repository.clone(),
                record: record.clone(),
                tier,
                source_path: source_path.to_path_buf(),
                output_path: allocation.derived_path(tier),
            };
            let permits = permits.clone();

            tasks.spawn(
                async move {
                    let _permit = permits.acquire_owned().await.map_err(|e| {
                        AppError::Internal(format!("Derivation scheduler closed: {}", e))
                    })?;
                    job.run().await
                }
                .instrument(tracing::Span::current()),
            );
        }

        let mut first_error: Option<AppError> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| AppError::Internal(format!("Derivation task failed: {}", e)))
                .and_then(|result| result);

            if let Err(e) = result {
                tracing::error!(error = %e, "Tier derivation aborted");
                first_error.get_or_insert(e);
            }
        }

        let record = record.lock().await.clone();
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(
                    derived = record.derived_paths.len(),
                    requested = self.tiers.len(),
                    "Derivation finished"
                );
                Ok(record)
            }
        }
    }
}

/// Removes a tier output on drop unless it was committed to the record.
///
/// Covers every way a tier can end without a commit, including the whole upload future
/// being dropped mid-encode, which aborts the task before any cleanup code can run.
struct UncommittedOutput {
    path: PathBuf,
    committed: bool,
}

impl UncommittedOutput {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for UncommittedOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed uncommitted tier output")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove uncommitted tier output"
            ),
        }
    }
}

struct TierJob {
    transcoder: Arc<dyn Transcoder>,
    repository: Arc<dyn VideoRepository>,
    record: Arc<Mutex<VideoRecord>>,
    tier: QualityTier,
    source_path: PathBuf,
    output_path: PathBuf,
}

impl TierJob {
    async fn run(self) -> Result<(), AppError> {
        let tier = self.tier.label();
        let mut output = UncommittedOutput::new(self.output_path.clone());

        let outcome = self
            .transcoder
            .invoke(&self.source_path, &self.output_path, tier)
            .await
            .map_err(|e| self.transcode_error(e))?;

        match outcome {
            TranscodeOutcome::Succeeded => {
                // Held across the write so commits land one tier at a time.
                let mut record = self.record.lock().await;
                let mut updated = record.clone();
                updated.insert_derived(self.tier, self.output_path.clone());
                self.repository.update(&updated).await?;
                *record = updated;
                output.commit();

                tracing::info!(tier, path = %self.output_path.display(), "Tier available");
            }
            TranscodeOutcome::Failed { exit_code } => {
                tracing::warn!(tier, exit_code = ?exit_code, "Tier unavailable, encoder failed");
            }
            TranscodeOutcome::UnsupportedTier => {
                tracing::warn!(tier, "Tier unavailable, not in the quality table");
            }
        }

        Ok(())
    }

    fn transcode_error(&self, err: TranscodeError) -> AppError {
        let source_path = self.source_path.display().to_string();
        match err {
            TranscodeError::Launch { source, .. } => AppError::ProcessLaunch {
                tier: self.tier.label().to_string(),
                source_path,
                message: source.to_string(),
            },
            TranscodeError::InvalidPath(path) => AppError::ProcessLaunch {
                tier: self.tier.label().to_string(),
                source_path,
                message: format!("invalid encoder path {}", path),
            },
            TranscodeError::Io(e) => AppError::Storage(format!(
                "Encoder I/O failed for tier {} (source {}): {}",
                self.tier, source_path, e
            )),
        }
    }
}
