//! StreamVault Storage Library
//!
//! Local filesystem placement for uploaded originals and their derived artifacts.
//!
//! # File layout
//!
//! Every upload draws a random base token. Inside the storage root:
//!
//! - **Original**: `{token}{ext}`
//! - **Derived tier**: `{token}_{tier}{ext}` (e.g. `3f2a..._720p.mp4`)
//!
//! `{ext}` is taken from the uploaded file name when it is a plain alphanumeric extension,
//! and falls back to `.mp4` otherwise. Path generation is centralized in the
//! `allocation` module so the original and every derived tier stay consistent.

pub mod allocation;
pub mod error;
pub mod local;

// Re-export commonly used types
pub use allocation::{extension_for, StorageAllocation};
pub use error::{StorageError, StorageResult};
pub use local::{LocalStorage, StoredOriginal};
