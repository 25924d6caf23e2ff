//! StreamVault Core Library
//!
//! This crate provides the domain model, quality tier table, error types and configuration
//! shared by every StreamVault component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, RecordStoreBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{NewVideo, QualityTier, VideoRecord, VideoResponse};
