use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::Utc;
use streamvault_core::{AppError, NewVideo, VideoRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::VideoRepository;

/// Process-local record store. Records are kept in insertion order.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<Vec<VideoRecord>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, AppError> {
        let record = VideoRecord {
            id: Uuid::new_v4(),
            title: video.title,
            original_file_name: video.original_file_name,
            content_type: video.content_type,
            file_size_bytes: video.file_size_bytes,
            uploaded_at: Utc::now(),
            original_path: video.original_path,
            derived_paths: BTreeMap::new(),
        };

        self.videos.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let videos = self.videos.read().await;
        Ok(videos.iter().find(|v| v.id == id).cloned())
    }

    async fn update(&self, video: &VideoRecord) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        let existing = videos
            .iter_mut()
            .find(|v| v.id == video.id)
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", video.id)))?;
        existing.derived_paths = video.derived_paths.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut videos = self.videos.write().await;
        let before = videos.len();
        videos.retain(|v| v.id != id);
        Ok(videos.len() < before)
    }

    async fn list_by_uploaded_desc(&self) -> Result<Vec<VideoRecord>, AppError> {
        let videos = self.videos.read().await;
        // Later inserts win ties on identical timestamps.
        let mut listed: Vec<VideoRecord> = videos.iter().rev().cloned().collect();
        listed.sort_by_key(|v| Reverse(v.uploaded_at));
        Ok(listed)
    }
}
