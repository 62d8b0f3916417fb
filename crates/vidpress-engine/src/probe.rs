//! Video metadata extraction backed by ffprobe.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format
//! -show_streams` and maps the JSON output into [`VideoMetadata`]: duration,
//! pixel dimensions, and the estimated original bitrate derived from file
//! size over duration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vidpress_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Upper bound on a single probe; a malformed file must not hang the batch.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata derived for one selected video file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Pixel width of the primary video stream.
    pub width: u32,
    /// Pixel height of the primary video stream.
    pub height: u32,
    /// Estimated original bitrate in kbps: `size * 8 / duration / 1000`.
    pub bitrate_kbps: u32,
}

/// Probe a video file and return its metadata.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if the file does not exist and
/// [`Error::Metadata`] for every probing failure (ffprobe missing or
/// failing, unparseable JSON, no video stream, zero duration).
pub async fn extract_metadata(registry: &ToolRegistry, path: &Path) -> Result<VideoMetadata> {
    let file_size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::file_not_found(path));
        }
        Err(e) => return Err(Error::metadata(path, e.to_string())),
    };

    let ffprobe = registry
        .require("ffprobe")
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    let mut cmd = ToolCommand::new(ffprobe.path.clone());
    cmd.timeout(PROBE_TIMEOUT);
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    cmd.arg(path.to_string_lossy().as_ref());

    let output = cmd
        .execute()
        .await
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    parse_probe_output(path, file_size, &output.stdout)
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Map raw ffprobe JSON into [`VideoMetadata`].
///
/// Split out from [`extract_metadata`] so the mapping is testable without an
/// ffprobe binary.
fn parse_probe_output(path: &Path, file_size: u64, json_str: &str) -> Result<VideoMetadata> {
    let probed: FfprobeOutput = serde_json::from_str(json_str)
        .map_err(|e| Error::metadata(path, format!("ffprobe JSON parse error: {e}")))?;

    let duration_secs = probed
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::metadata(path, "missing or unparseable duration"))?;

    if duration_secs <= 0.0 {
        return Err(Error::metadata(path, "duration is zero"));
    }

    let video = probed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| Error::metadata(path, "no video stream"))?;

    Ok(VideoMetadata {
        duration_secs,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        bitrate_kbps: estimate_bitrate_kbps(file_size, duration_secs),
    })
}

/// Estimate the original bitrate in kbps from byte size and duration.
fn estimate_bitrate_kbps(file_size: u64, duration_secs: f64) -> u32 {
    if duration_secs <= 0.0 {
        return 0;
    }
    ((file_size as f64 * 8.0 / duration_secs) / 1000.0).round() as u32
}
