//! Converter trait and the shipped yt-dlp implementation
//!
//! A converter turns a source locator into a single audio artifact inside
//! the job's work directory. The call is slow (seconds to minutes),
//! fallible, and must honor cancellation promptly.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{DownloadConfig, ToolsConfig};
use crate::error::{Error, Result};
use crate::types::Artifact;
use crate::utils::{name_from_source, sanitize_file_name};

/// How many trailing bytes of converter stderr to forward on failure
const STDERR_TAIL_BYTES: usize = 512;

/// External media-to-audio conversion
///
/// Implementations must either abort promptly when `cancel` fires or
/// tolerate the worker abandoning the call (the worker stops waiting
/// regardless and treats the job as canceled).
#[async_trait]
pub trait Converter: Send + Sync {
    /// Fetch `source` and produce one audio artifact inside `work_dir`.
    ///
    /// `name_override` is the requester-chosen filename stem; when absent
    /// the implementation derives one from the content's metadata.
    async fn convert(
        &self,
        source: &str,
        name_override: Option<&str>,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Artifact>;
}

/// Converter shelling out to yt-dlp with audio extraction
pub struct YtDlpConverter {
    binary: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    audio_format: String,
    audio_quality: String,
}

impl YtDlpConverter {
    /// Create a converter using an explicit yt-dlp binary path
    pub fn new(binary: PathBuf, download: &DownloadConfig) -> Self {
        Self {
            binary,
            ffmpeg_path: None,
            audio_format: download.audio_format.clone(),
            audio_quality: download.audio_quality.clone(),
        }
    }

    /// Locate yt-dlp on PATH; returns None if not found
    pub fn from_path(download: &DownloadConfig) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|binary| Self::new(binary, download))
    }

    /// Build a converter from configuration, preferring an explicit path
    /// over PATH discovery
    pub fn from_config(tools: &ToolsConfig, download: &DownloadConfig) -> Result<Self> {
        let mut converter = if let Some(ref path) = tools.ytdlp_path {
            Self::new(path.clone(), download)
        } else if tools.search_path {
            Self::from_path(download).ok_or_else(|| {
                Error::NotSupported("yt-dlp binary not found on PATH".to_string())
            })?
        } else {
            return Err(Error::NotSupported(
                "no yt-dlp path configured and PATH search disabled".to_string(),
            ));
        };
        converter.ffmpeg_path = tools.ffmpeg_path.clone();
        Ok(converter)
    }

    /// Output template handed to yt-dlp: the requested stem when one was
    /// given, otherwise the content title.
    fn output_template(&self, name_override: Option<&str>, work_dir: &Path) -> PathBuf {
        match name_override {
            Some(name) => work_dir.join(format!("{}.%(ext)s", sanitize_file_name(name))),
            None => work_dir.join("%(title)s.%(ext)s"),
        }
    }
}

#[async_trait]
impl Converter for YtDlpConverter {
    async fn convert(
        &self,
        source: &str,
        name_override: Option<&str>,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Artifact> {
        let outtmpl = self.output_template(name_override, work_dir);

        let mut command = tokio::process::Command::new(&self.binary);
        command
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--output")
            .arg(&outtmpl)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref ffmpeg) = self.ffmpeg_path {
            command.arg("--ffmpeg-location").arg(ffmpeg);
        }

        command.arg("--").arg(source);

        let child = command
            .spawn()
            .map_err(|e| Error::Conversion(format!("failed to spawn yt-dlp: {}", e)))?;

        // Race the process against cancellation; kill_on_drop reaps the
        // child when the cancellation branch wins.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(source = %source, "yt-dlp killed by cancellation");
                return Err(Error::Canceled);
            }
            result = child.wait_with_output() => {
                result.map_err(|e| Error::Conversion(format!("yt-dlp did not run: {}", e)))?
            }
        };

        if !output.status.success() {
            // Take the byte tail first, then decode: a multibyte character
            // split by the cut must not land mid-char.
            let tail_start = output.stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            let detail = String::from_utf8_lossy(&output.stderr[tail_start..]);
            return Err(Error::Conversion(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                detail.trim()
            )));
        }

        find_artifact(work_dir, &self.audio_format, source).await
    }
}

/// Scan the work directory for the produced audio file
///
/// yt-dlp decides the final filename (title-derived unless overridden),
/// so the artifact is located by extension after the process exits. A
/// produced name that is not valid UTF-8 cannot be used as a delivery
/// filename; one is derived from the source locator instead.
async fn find_artifact(work_dir: &Path, audio_format: &str, source: &str) -> Result<Artifact> {
    let mut entries = tokio::fs::read_dir(work_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches_format = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(audio_format));
        if !matches_format {
            continue;
        }

        let metadata = entry.metadata().await?;
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => format!("{}.{}", name_from_source(source), audio_format),
        };

        return Ok(Artifact {
            size_bytes: metadata.len(),
            path,
            filename,
        });
    }

    Err(Error::Conversion(format!(
        "no .{} file produced in {}",
        audio_format,
        work_dir.display()
    )))
}
