//! Artifact resolution by quality.
//!
//! A missing or unknown quality always falls back to the original, so any existing record
//! resolves to a servable path.

use std::path::PathBuf;

use streamvault_core::constants::TRANSCODED_CONTENT_TYPE;
use streamvault_core::{QualityTier, VideoRecord};

/// The file to serve for a request, with the headers it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub path: PathBuf,
    pub content_type: String,
    /// `None` when the original is served.
    pub tier: Option<QualityTier>,
    /// Name presented to clients in `Content-Disposition`.
    pub file_name: String,
}

/// Derived tier matching `requested_quality`, if that tier has an artifact.
fn derived_tier(record: &VideoRecord, requested_quality: Option<&str>) -> Option<QualityTier> {
    let quality = requested_quality?;
    record.derived_path(quality)?;
    QualityTier::from_label(quality)
}

pub fn resolve(record: &VideoRecord, requested_quality: Option<&str>) -> ResolvedArtifact {
    let tier = derived_tier(record, requested_quality);
    let path = tier
        .and_then(|tier| record.derived_path(tier.label()))
        .unwrap_or(record.original_path.as_path())
        .to_path_buf();

    let file_name = record
        .original_file_name
        .clone()
        .or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| record.id.to_string());

    ResolvedArtifact {
        content_type: content_type_for(record, requested_quality),
        path,
        tier,
        file_name,
    }
}

/// Stored content type for the original, the fixed transcoded type for a derived artifact.
pub fn content_type_for(record: &VideoRecord, requested_quality: Option<&str>) -> String {
    match derived_tier(record, requested_quality) {
        Some(_) => TRANSCODED_CONTENT_TYPE.to_string(),
        None => record.content_type.clone(),
    }
}
