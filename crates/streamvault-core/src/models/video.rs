use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;
use uuid::Uuid;

use super::quality::QualityTier;
use crate::constants::ORIGINAL_QUALITY;

/// Persisted metadata for one uploaded video and the artifacts derived from it.
///
/// `original_path` is set when the record is created and never changes. A key in
/// `derived_paths` exists only once that tier has been encoded successfully; there is no
/// placeholder for a pending or failed tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    pub id: Uuid,
    pub title: String,
    pub original_file_name: Option<String>,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub original_path: PathBuf,
    pub derived_paths: BTreeMap<String, PathBuf>,
}

impl VideoRecord {
    /// Path of a derived artifact, matching the tier label case-insensitively.
    pub fn derived_path(&self, quality: &str) -> Option<&Path> {
        let quality = quality.trim();
        self.derived_paths
            .iter()
            .find(|(tier, _)| tier.eq_ignore_ascii_case(quality))
            .map(|(_, path)| path.as_path())
    }

    /// Record a successfully derived tier.
    pub fn insert_derived(&mut self, tier: QualityTier, path: PathBuf) {
        self.derived_paths.insert(tier.label().to_string(), path);
    }

    /// Tiers with a derived artifact, in table order.
    pub fn available_tiers(&self) -> Vec<QualityTier> {
        QualityTier::ALL
            .into_iter()
            .filter(|tier| self.derived_path(tier.label()).is_some())
            .collect()
    }

    /// `original` followed by the derived tier labels in table order.
    pub fn available_qualities(&self) -> Vec<String> {
        std::iter::once(ORIGINAL_QUALITY.to_string())
            .chain(
                self.available_tiers()
                    .into_iter()
                    .map(|tier| tier.label().to_string()),
            )
            .collect()
    }

    /// Every file this record references: the original first, then derived artifacts.
    pub fn artifact_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.original_path.as_path())
            .chain(self.derived_paths.values().map(PathBuf::as_path))
    }
}

/// Fields needed to create a record. The store assigns `id` and `uploaded_at`.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub original_file_name: Option<String>,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub original_path: PathBuf,
}

/// Client-facing view of a record. Storage paths stay on the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub original_file_name: Option<String>,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    /// `original` followed by every derived tier label
    pub available_qualities: Vec<String>,
}

impl From<VideoRecord> for VideoResponse {
    fn from(video: VideoRecord) -> Self {
        let available_qualities = video.available_qualities();

        VideoResponse {
            id: video.id,
            title: video.title,
            original_file_name: video.original_file_name,
            content_type: video.content_type,
            file_size_bytes: video.file_size_bytes,
            uploaded_at: video.uploaded_at,
            available_qualities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> VideoRecord {
        VideoRecord {
            id: Uuid::new_v4(),
            title: "Demo".to_string(),
            original_file_name: Some("clip.mp4".to_string()),
            content_type: "video/mp4".to_string(),
            file_size_bytes: 1024,
            uploaded_at: Utc::now(),
            original_path: PathBuf::from("/data/abc.mp4"),
            derived_paths: BTreeMap::new(),
        }
    }

    #[test]
    fn test_derived_path_lookup_is_case_insensitive() {
        let mut video = test_record();
        video.insert_derived(QualityTier::Hd720, PathBuf::from("/data/abc_720p.mp4"));

        assert_eq!(
            video.derived_path("720P"),
            Some(Path::new("/data/abc_720p.mp4"))
        );
        assert_eq!(video.derived_path("1080p"), None);
    }

    #[test]
    fn test_available_qualities_starts_with_original() {
        let mut video = test_record();
        assert_eq!(video.available_qualities(), vec!["original"]);

        video.insert_derived(QualityTier::Hd720, PathBuf::from("/data/abc_720p.mp4"));
        assert_eq!(video.available_qualities(), vec!["original", "720p"]);
    }

    #[test]
    fn test_artifact_paths_lists_original_first() {
        let mut video = test_record();
        video.insert_derived(QualityTier::Hd1080, PathBuf::from("/data/abc_1080p.mp4"));
        video.insert_derived(QualityTier::Hd720, PathBuf::from("/data/abc_720p.mp4"));

        let paths: Vec<&Path> = video.artifact_paths().collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], Path::new("/data/abc.mp4"));
    }

    #[test]
    fn test_video_response_lists_qualities_in_table_order() {
        let mut video = test_record();
        video.insert_derived(QualityTier::Hd1080, PathBuf::from("/data/abc_1080p.mp4"));
        video.insert_derived(QualityTier::Hd720, PathBuf::from("/data/abc_720p.mp4"));
        let id = video.id;

        let response = VideoResponse::from(video);

        assert_eq!(response.id, id);
        assert_eq!(response.title, "Demo");
        assert_eq!(
            response.available_qualities,
            vec!["original".to_string(), "720p".to_string(), "1080p".to_string()]
        );
    }

    #[test]
    fn test_video_response_without_derived_tiers() {
        let response = VideoResponse::from(test_record());
        assert_eq!(response.available_qualities, vec!["original".to_string()]);
    }
}
