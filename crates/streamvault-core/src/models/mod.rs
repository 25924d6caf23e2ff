//! Data models for the application

mod quality;
mod video;

pub use quality::QualityTier;
pub use video::{NewVideo, VideoRecord, VideoResponse};
