//! Shared constants.

/// Extension used for stored files when the upload name has no usable extension.
pub const DEFAULT_EXTENSION: &str = ".mp4";

/// Media type of every derived artifact. The encoder always writes MP4.
pub const TRANSCODED_CONTENT_TYPE: &str = "video/mp4";

/// Prefix a declared content type must carry to be accepted.
pub const VIDEO_CONTENT_TYPE_PREFIX: &str = "video/";

/// Quality label used for the untouched upload in listings.
pub const ORIGINAL_QUALITY: &str = "original";

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

pub const API_PREFIX: &str = "/api";
