//! Data model for one batch run.

use std::path::PathBuf;

use vidpress_core::config::DefaultsConfig;
use vidpress_core::{Error, Result};
use vidpress_engine::VideoMetadata;

/// A file that passed video-type selection, before metadata probing.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Path to the input file.
    pub path: PathBuf,
    /// File name component, used for result naming.
    pub name: String,
    /// Size of the input in bytes.
    pub size_bytes: u64,
}

/// One input file plus its probed metadata.
#[derive(Debug, Clone)]
pub struct Job {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub metadata: VideoMetadata,
}

impl Job {
    /// Combine a selected file with its probed metadata.
    pub fn new(file: SelectedFile, metadata: VideoMetadata) -> Self {
        Self {
            path: file.path,
            name: file.name,
            size_bytes: file.size_bytes,
            metadata,
        }
    }
}

/// Target parameters shared by every job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionParameters {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Target video bitrate in kbps.
    pub bitrate_kbps: u32,
}

impl CompressionParameters {
    /// Check the invariants a batch may not start without: positive
    /// dimensions and a bitrate at or above the minimum.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Validation(
                "width and height must be greater than 0".into(),
            ));
        }
        if self.bitrate_kbps < DefaultsConfig::MIN_BITRATE_KBPS {
            return Err(Error::Validation(format!(
                "bitrate must be at least {} kbps",
                DefaultsConfig::MIN_BITRATE_KBPS
            )));
        }
        Ok(())
    }
}

impl From<&DefaultsConfig> for CompressionParameters {
    fn from(defaults: &DefaultsConfig) -> Self {
        Self {
            width: defaults.width,
            height: defaults.height,
            bitrate_kbps: defaults.bitrate_kbps,
        }
    }
}

/// Output of one completed job.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// Name of the input file this result was produced from.
    pub original_name: String,
    /// Compressed output bytes.
    pub data: Vec<u8>,
    /// Length of `data`.
    pub size_bytes: u64,
}

/// Lifecycle of one batch run.
///
/// The stop-on-first-failure policy is part of the transition table: from
/// `Running` the only successors are the next index, `Done`, or `Failed` —
/// there is no "skip" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No batch accepted yet (or a finished batch was reset).
    Idle,
    /// The external engine is initializing.
    LoadingEngine,
    /// Job `index` is being processed.
    Running { index: usize },
    /// Every job completed; results are available.
    Done,
    /// A step failed; remaining jobs were never attempted.
    Failed,
}

impl BatchState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: BatchState) -> bool {
        use BatchState::*;
        match (self, next) {
            (Idle, LoadingEngine) => true,
            (LoadingEngine, Running { index }) => index == 0,
            (LoadingEngine, Failed) => true,
            (Running { index: a }, Running { index: b }) => b == a + 1,
            (Running { .. }, Done) => true,
            (Running { .. }, Failed) => true,
            _ => false,
        }
    }

    /// Move to `next` if the transition is legal; returns whether it was.
    pub fn advance(&mut self, next: BatchState) -> bool {
        if self.can_advance_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_reject_zero_width() {
        let params = CompressionParameters {
            width: 0,
            height: 192,
            bitrate_kbps: 100,
        };
        assert!(matches!(params.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn parameters_reject_zero_height_regardless_of_rest() {
        let params = CompressionParameters {
            width: 1920,
            height: 0,
            bitrate_kbps: 5000,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn parameters_reject_low_bitrate() {
        let params = CompressionParameters {
            width: 384,
            height: 192,
            bitrate_kbps: 99,
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn parameters_from_config_defaults() {
        let params = CompressionParameters::from(&DefaultsConfig::default());
        assert_eq!(params.width, 384);
        assert_eq!(params.height, 192);
        assert_eq!(params.bitrate_kbps, 100);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn state_machine_accepts_happy_path() {
        let mut state = BatchState::Idle;
        assert!(state.advance(BatchState::LoadingEngine));
        assert!(state.advance(BatchState::Running { index: 0 }));
        assert!(state.advance(BatchState::Running { index: 1 }));
        assert!(state.advance(BatchState::Done));
        assert_eq!(state, BatchState::Done);
    }

    #[test]
    fn state_machine_accepts_failure_edges() {
        assert!(BatchState::LoadingEngine.can_advance_to(BatchState::Failed));
        assert!(BatchState::Running { index: 3 }.can_advance_to(BatchState::Failed));
    }

    #[test]
    fn state_machine_rejects_illegal_transitions() {
        assert!(!BatchState::Idle.can_advance_to(BatchState::Running { index: 0 }));
        assert!(!BatchState::Idle.can_advance_to(BatchState::Done));
        assert!(!BatchState::LoadingEngine.can_advance_to(BatchState::Running { index: 1 }));
        // Indices only move forward, one at a time.
        assert!(!BatchState::Running { index: 0 }.can_advance_to(BatchState::Running { index: 2 }));
        assert!(!BatchState::Running { index: 2 }.can_advance_to(BatchState::Running { index: 1 }));
        assert!(!BatchState::Done.can_advance_to(BatchState::Failed));
        assert!(!BatchState::Failed.can_advance_to(BatchState::Done));
    }

    #[test]
    fn failed_advance_leaves_state_untouched() {
        let mut state = BatchState::Idle;
        assert!(!state.advance(BatchState::Done));
        assert_eq!(state, BatchState::Idle);
    }
}
