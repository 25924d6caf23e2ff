use std::path::Path;

use streamvault_core::constants::{MAX_TITLE_LENGTH, VIDEO_CONTENT_TYPE_PREFIX};
use streamvault_core::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Rejections raised before anything is written to storage
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {0} (expected video/*)")]
    InvalidContentType(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { max, .. } => AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max / 1024 / 1024
            )),
            ValidationError::InvalidContentType(_) => {
                AppError::InvalidInput("File must be a video".to_string())
            }
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Strip MIME parameters (e.g. `video/mp4; codecs=avc1` -> `video/mp4`).
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Upload validator
///
/// Checks title, declared content type and size. Stateless apart from the size limit.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
}

impl UploadValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Returns the trimmed title.
    pub fn validate_title(&self, title: &str) -> Result<String, ValidationError> {
        let title = title.trim();

        if title.is_empty() {
            return Err(ValidationError::InvalidTitle(
                "Title cannot be empty".to_string(),
            ));
        }

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ValidationError::InvalidTitle(format!(
                "Title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }

        if title.chars().any(char::is_control) {
            return Err(ValidationError::InvalidTitle(
                "Title cannot contain control characters".to_string(),
            ));
        }

        Ok(title.to_string())
    }

    /// Accepts any `video/<subtype>`, case-insensitively. Returns the trimmed declared type.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let normalized = normalize_mime_type(content_type);

        match normalized.strip_prefix(VIDEO_CONTENT_TYPE_PREFIX) {
            Some(subtype) if !subtype.is_empty() => Ok(content_type.trim().to_string()),
            _ => Err(ValidationError::InvalidContentType(content_type.to_string())),
        }
    }

    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }
}

/// Keep only the final path component of a client-supplied file name, without control
/// characters or quotes. Returns `None` when nothing usable remains.
pub fn sanitize_filename(filename: Option<&str>) -> Option<String> {
    let filename = filename?;
    let name_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = name_only
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
        .take(MAX_FILENAME_LENGTH)
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        None
    } else {
        Some(sanitized.to_string())
    }
}
