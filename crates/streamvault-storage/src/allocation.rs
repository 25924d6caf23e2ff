//! Shared path generation for originals and derived artifacts.

use std::path::{Path, PathBuf};

use streamvault_core::constants::DEFAULT_EXTENSION;
use streamvault_core::QualityTier;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

const MAX_EXTENSION_LEN: usize = 10;

/// Extension (with its leading dot) used for files of an upload.
///
/// Only a short alphanumeric extension from the uploaded name is kept; anything else
/// (missing, empty, path separators, overly long) falls back to `.mp4`.
pub fn extension_for(original_filename: Option<&str>) -> String {
    original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// The set of paths reserved for one upload: the original and one per tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAllocation {
    root: PathBuf,
    base: String,
    extension: String,
}

impl StorageAllocation {
    /// Fresh allocation with a random base token.
    pub(crate) fn generate(root: &Path, original_filename: Option<&str>) -> Self {
        Self {
            root: root.to_path_buf(),
            base: Uuid::new_v4().simple().to_string(),
            extension: extension_for(original_filename),
        }
    }

    /// Recover the allocation an original was stored under.
    pub fn from_original_path(original_path: &Path) -> StorageResult<Self> {
        let invalid = || StorageError::InvalidPath(original_path.display().to_string());

        let root = original_path.parent().ok_or_else(invalid)?.to_path_buf();
        let base = original_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?
            .to_string();
        let extension = original_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        Ok(Self {
            root,
            base,
            extension,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn original_path(&self) -> PathBuf {
        self.root.join(format!("{}{}", self.base, self.extension))
    }

    pub fn derived_path(&self, tier: QualityTier) -> PathBuf {
        self.root
            .join(format!("{}_{}{}", self.base, tier.label(), self.extension))
    }

    /// Path for the original (`None`) or for a derived tier.
    pub fn path_for(&self, tier: Option<QualityTier>) -> PathBuf {
        match tier {
            Some(tier) => self.derived_path(tier),
            None => self.original_path(),
        }
    }
}
