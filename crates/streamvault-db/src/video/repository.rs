use streamvault_core::{AppError, NewVideo, VideoRecord};
use uuid::Uuid;

/// Trait for video record persistence
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a record. The store assigns the id and upload timestamp.
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Persist the mutable part of a record (its derived paths).
    async fn update(&self, video: &VideoRecord) -> Result<(), AppError>;

    /// Returns `false` when no record had this id.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// All records, most recent upload first.
    async fn list_by_uploaded_desc(&self) -> Result<Vec<VideoRecord>, AppError>;
}
