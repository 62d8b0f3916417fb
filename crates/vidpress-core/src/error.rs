//! Unified error type for the vidpress application.
//!
//! All crates funnel their failures into [`Error`]. The batch loop aborts on
//! the first error it sees; the CLI renders every error as a single
//! human-readable status line via its `Display` impl.

use std::path::PathBuf;

/// Unified error type covering all failure modes in vidpress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The selection contained no video-typed files.
    #[error("no valid video files selected")]
    NoValidFiles,

    /// A selected file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Metadata extraction failed for a file.
    #[error("failed to read video metadata for {}: {message}", path.display())]
    Metadata {
        /// The file being probed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// The transcoding engine failed to initialize.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// A specific job failed during write/exec/read.
    #[error("error processing video {}: {message}", index + 1)]
    Transcode {
        /// Zero-based index of the failing job.
        index: usize,
        /// Human-readable error description.
        message: String,
    },

    /// Post-transcode cleanup of the engine's scratch files failed.
    #[error("cleanup failed for video {}: {message}", index + 1)]
    Cleanup {
        /// Zero-based index of the job whose files could not be removed.
        index: usize,
        /// Human-readable error description.
        message: String,
    },

    /// Writing a compressed result to disk failed.
    #[error("download failed: {0}")]
    Download(String),

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Input data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for [`Error::FileNotFound`].
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Convenience constructor for [`Error::Metadata`].
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(index: usize, message: impl Into<String>) -> Self {
        Error::Transcode {
            index,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Cleanup`].
    pub fn cleanup(index: usize, message: impl Into<String>) -> Self {
        Error::Cleanup {
            index,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
