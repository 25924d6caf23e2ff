//! External encoder supervision
//!
//! One `ffmpeg` process per derived tier. Its stdout and stderr are drained line by line in
//! background tasks while the exit status is awaited, so a chatty encoder can never block
//! on a full pipe.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use streamvault_core::QualityTier;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Outcome of one encode. A nonzero exit is an expected result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Succeeded,
    /// `exit_code` is `None` when the encoder was killed by a signal.
    Failed { exit_code: Option<i32> },
    /// The tier is not in the quality table; no process was launched.
    UnsupportedTier,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Failed to launch encoder {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Encoder I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid encoder path: {0}")]
    InvalidPath(String),
}

/// Produces a tier artifact from a source file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn invoke(
        &self,
        source_path: &Path,
        output_path: &Path,
        tier: &str,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}

/// Transcoder backed by the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, TranscodeError> {
        let ffmpeg_path = ffmpeg_path.into();

        let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if ffmpeg_path.trim().is_empty() || ffmpeg_path.chars().any(|c| dangerous_chars.contains(&c))
        {
            return Err(TranscodeError::InvalidPath(ffmpeg_path));
        }

        Ok(Self { ffmpeg_path })
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    fn build_args(source_path: &Path, output_path: &Path, tier: QualityTier) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-nostdin".into(), "-nostats".into(), "-y".into()];
        args.push("-i".into());
        args.push(source_path.into());
        args.extend(
            [
                "-vf".to_string(),
                format!("scale=-2:{}", tier.target_height()),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                "medium".to_string(),
                "-crf".to_string(),
                "23".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                "128k".to_string(),
                "-movflags".to_string(),
                "+faststart".to_string(),
                "-f".to_string(),
                "mp4".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output_path.into());
        args
    }

    async fn remove_partial_output(output_path: &Path) {
        match tokio::fs::remove_file(output_path).await {
            Ok(()) => {
                tracing::debug!(path = %output_path.display(), "Removed partial encoder output")
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %output_path.display(),
                error = %e,
                "Failed to remove partial encoder output"
            ),
        }
    }
}

/// Log every line of an encoder output stream until it closes.
fn spawn_drain<R>(stream: Option<R>, tier: &'static str) -> JoinHandle<io::Result<u64>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(stream) = stream else {
            return Ok(0);
        };

        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        let mut lines = 0u64;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            lines += 1;
            let text = String::from_utf8_lossy(&line);
            tracing::debug!(tier, "ffmpeg: {}", text.trim_end());
        }
        Ok(lines)
    })
}

async fn join_drain(handle: JoinHandle<io::Result<u64>>) -> io::Result<u64> {
    handle.await.map_err(io::Error::other)?
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn invoke(
        &self,
        source_path: &Path,
        output_path: &Path,
        tier: &str,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let Some(quality) = QualityTier::from_label(tier) else {
            tracing::warn!(tier = %tier, "Unsupported quality tier, skipping encode");
            return Ok(TranscodeOutcome::UnsupportedTier);
        };
        let label = quality.label();
        let start = Instant::now();

        tracing::info!(
            tier = label,
            source = %source_path.display(),
            output = %output_path.display(),
            "Starting ffmpeg encode"
        );

        let mut child = Command::new(&self.ffmpeg_path)
            .args(Self::build_args(source_path, output_path, quality))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Launch {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        let stdout_task = spawn_drain(child.stdout.take(), label);
        let stderr_task = spawn_drain(child.stderr.take(), label);

        let status = child.wait().await;
        let drained = tokio::try_join!(join_drain(stdout_task), join_drain(stderr_task));

        let status = match (status, drained) {
            (Ok(status), Ok((stdout_lines, stderr_lines))) => {
                tracing::debug!(tier = label, stdout_lines, stderr_lines, "Encoder output drained");
                status
            }
            (Err(e), _) | (_, Err(e)) => {
                Self::remove_partial_output(output_path).await;
                return Err(TranscodeError::Io(e));
            }
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if status.success() {
            tracing::info!(
                tier = label,
                output = %output_path.display(),
                duration_ms,
                "ffmpeg encode succeeded"
            );
            return Ok(TranscodeOutcome::Succeeded);
        }

        let exit_code = status.code();
        tracing::warn!(
            tier = label,
            source = %source_path.display(),
            exit_code = ?exit_code,
            duration_ms,
            "ffmpeg encode failed"
        );
        Self::remove_partial_output(output_path).await;

        Ok(TranscodeOutcome::Failed { exit_code })
    }
}
