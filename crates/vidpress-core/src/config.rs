//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! default compression parameters, tool path overrides, and output location.
//! Every section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub tools: ToolsConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.defaults.width == 0 || self.defaults.height == 0 {
            warnings.push("defaults.width and defaults.height must be greater than 0".into());
        }

        if self.defaults.bitrate_kbps < DefaultsConfig::MIN_BITRATE_KBPS {
            warnings.push(format!(
                "defaults.bitrate_kbps is below the {} kbps minimum",
                DefaultsConfig::MIN_BITRATE_KBPS
            ));
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!("tools.ffmpeg_path does not exist: {}", p.display()));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!("tools.ffprobe_path does not exist: {}", p.display()));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Default compression parameters used when the CLI flags are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Target video bitrate in kbps.
    pub bitrate_kbps: u32,
}

impl DefaultsConfig {
    /// Minimum accepted target bitrate.
    pub const MIN_BITRATE_KBPS: u32 = 100;
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            width: 384,
            height: 192,
            bitrate_kbps: 100,
        }
    }
}

/// Optional overrides for external tool locations.
///
/// When a path is absent (or does not exist) the tool is located via `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Where compressed outputs are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory compressed files are saved into.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
