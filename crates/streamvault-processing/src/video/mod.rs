mod derivation;
pub mod resolver;
mod transcoder;

pub use derivation::DerivationOrchestrator;
pub use resolver::ResolvedArtifact;
pub use transcoder::{FfmpegTranscoder, TranscodeError, TranscodeOutcome, Transcoder};
