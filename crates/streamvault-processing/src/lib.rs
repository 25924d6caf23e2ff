//! StreamVault Processing
//!
//! The ingestion-and-derivation pipeline: upload validation, encoder supervision,
//! per-tier derivation, artifact resolution and purge.

pub mod pipeline;
pub mod validator;
pub mod video;

pub use pipeline::{UploadSource, VideoPipeline};
pub use validator::{UploadValidator, ValidationError};
pub use video::{
    DerivationOrchestrator, FfmpegTranscoder, ResolvedArtifact, TranscodeError, TranscodeOutcome,
    Transcoder,
};
