//! The transcoding engine contract and its ffmpeg-backed implementation.
//!
//! The engine is modelled after the external binary it wraps: an
//! initialize-once black box with a private file namespace that callers
//! populate, execute against, and read back from. All methods take
//! `&mut self` — the engine is a single shared stateful resource and
//! concurrent invocation is undefined, so exclusive access is enforced at
//! compile time instead of by convention.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use vidpress_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::{detect_version, ToolRegistry};

/// Upper bound on a single engine invocation.
const EXEC_TIMEOUT: Duration = Duration::from_secs(3600);

/// Callback receiving textual engine log lines.
pub type LogHandler = Box<dyn FnMut(&str) + Send>;

/// Callback receiving fractional progress in `[0, 1]`.
pub type ProgressHandler = Box<dyn FnMut(f64) + Send>;

/// Contract for an external transcoding engine.
///
/// Mirrors the operations the orchestrator needs: one-time initialization, a
/// named virtual-file namespace (write/read/delete), an execute call that
/// produces a named output file, and subscriptions for log lines and
/// fractional progress.
#[async_trait]
pub trait Engine: Send {
    /// Initialize the engine. Loaded exactly once per engine value;
    /// subsequent calls are no-ops.
    async fn init(&mut self) -> Result<()>;

    /// Whether [`init`](Engine::init) has completed successfully.
    fn loaded(&self) -> bool;

    /// Store `data` under `name` in the engine's namespace.
    async fn write_file(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Run the engine with the given argument list.
    ///
    /// `duration_hint` is the source duration in seconds, used to convert
    /// the engine's elapsed-time reports into fractional progress for the
    /// registered progress handler. Log lines stream to the registered log
    /// handler as they arrive.
    async fn exec(&mut self, args: &[String], duration_hint: Option<f64>) -> Result<()>;

    /// Read back the file stored under `name`.
    async fn read_file(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Remove the file stored under `name`.
    async fn delete_file(&mut self, name: &str) -> Result<()>;

    /// Register the handler receiving textual log lines.
    fn set_log_handler(&mut self, handler: LogHandler);

    /// Register the handler receiving fractional progress updates.
    fn set_progress_handler(&mut self, handler: ProgressHandler);
}

/// Engine implementation driving the ffmpeg CLI.
///
/// The virtual-file namespace is a [`TempDir`] created at init time; exec
/// runs ffmpeg with that directory as its working directory, so argument
/// lists refer to bare file names. The directory (and any leaked files) is
/// removed when the engine is dropped.
pub struct FfmpegEngine {
    tools: ToolRegistry,
    ffmpeg_path: Option<PathBuf>,
    scratch: Option<TempDir>,
    log_handler: Option<LogHandler>,
    progress_handler: Option<ProgressHandler>,
}

impl FfmpegEngine {
    /// Create an engine that will resolve ffmpeg through `tools` at init.
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            ffmpeg_path: None,
            scratch: None,
            log_handler: None,
            progress_handler: None,
        }
    }

    /// Resolve `name` inside the scratch namespace.
    fn scratch_file(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_scratch_name(name) {
            return Err(Error::Validation(format!(
                "invalid engine file name: {name:?}"
            )));
        }
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| Error::EngineInit("engine not initialized".into()))?;
        Ok(scratch.path().join(name))
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    async fn init(&mut self) -> Result<()> {
        if self.loaded() {
            return Ok(());
        }

        let ffmpeg = self
            .tools
            .require("ffmpeg")
            .map_err(|e| Error::EngineInit(e.to_string()))?;
        let path = ffmpeg.path.clone();

        let scratch = TempDir::new()
            .map_err(|e| Error::EngineInit(format!("failed to create scratch dir: {e}")))?;

        let version = detect_version(&path).unwrap_or_else(|| "unknown version".into());
        tracing::info!("ffmpeg engine loaded: {} ({version})", path.display());

        self.ffmpeg_path = Some(path);
        self.scratch = Some(scratch);
        Ok(())
    }

    fn loaded(&self) -> bool {
        self.scratch.is_some() && self.ffmpeg_path.is_some()
    }

    async fn write_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.scratch_file(name)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("wrote {} bytes to engine file {name}", data.len());
        Ok(())
    }

    async fn exec(&mut self, args: &[String], duration_hint: Option<f64>) -> Result<()> {
        let ffmpeg = self
            .ffmpeg_path
            .clone()
            .ok_or_else(|| Error::EngineInit("engine not initialized".into()))?;
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| Error::EngineInit("engine not initialized".into()))?;

        let mut cmd = ToolCommand::new(ffmpeg);
        cmd.timeout(EXEC_TIMEOUT);
        cmd.current_dir(scratch.path());
        cmd.args(["-y", "-progress", "pipe:2", "-nostats"]);
        cmd.args(args.iter().cloned());

        // Parse the -progress key=value protocol off stderr; everything that
        // is not part of the protocol is an ordinary log line.
        let log_handler = &mut self.log_handler;
        let progress_handler = &mut self.progress_handler;
        let mut last_out_time_us: Option<i64> = None;

        cmd.execute_streaming(|line| {
            if let Some(val) = line.strip_prefix("out_time_us=") {
                last_out_time_us = val.trim().parse::<i64>().ok();
            } else if let Some(val) = line.strip_prefix("progress=") {
                let fraction = if val.trim() == "end" {
                    Some(1.0)
                } else {
                    match (last_out_time_us, duration_hint) {
                        (Some(us), Some(dur)) => Some(progress_fraction(us, dur)),
                        _ => None,
                    }
                };
                if let (Some(fraction), Some(handler)) = (fraction, progress_handler.as_mut()) {
                    handler(fraction);
                }
            } else if !is_progress_protocol_line(line) {
                if let Some(handler) = log_handler.as_mut() {
                    handler(line);
                }
            }
        })
        .await?;

        Ok(())
    }

    async fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = self.scratch_file(name)?;
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }

    async fn delete_file(&mut self, name: &str) -> Result<()> {
        let path = self.scratch_file(name)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    fn set_log_handler(&mut self, handler: LogHandler) {
        self.log_handler = Some(handler);
    }

    fn set_progress_handler(&mut self, handler: ProgressHandler) {
        self.progress_handler = Some(handler);
    }
}

/// Convert an `out_time_us` report into a clamped fraction of `duration`.
fn progress_fraction(out_time_us: i64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    ((out_time_us as f64 / 1_000_000.0) / duration_secs).clamp(0.0, 1.0)
}

/// Engine namespace names are bare file names: no separators, no traversal.
fn is_valid_scratch_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Keys of the ffmpeg `-progress` protocol that are handled or ignored
/// rather than forwarded as log lines.
fn is_progress_protocol_line(line: &str) -> bool {
    const KEYS: &[&str] = &[
        "frame=",
        "fps=",
        "bitrate=",
        "total_size=",
        "out_time_ms=",
        "out_time=",
        "dup_frames=",
        "drop_frames=",
        "speed=",
    ];
    KEYS.iter().any(|k| line.starts_with(k)) || line.starts_with("stream_0_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_names_reject_separators() {
        assert!(is_valid_scratch_name("input_0.mp4"));
        assert!(is_valid_scratch_name("output_12.mp4"));
        assert!(!is_valid_scratch_name(""));
        assert!(!is_valid_scratch_name("../escape.mp4"));
        assert!(!is_valid_scratch_name("a/b.mp4"));
        assert!(!is_valid_scratch_name("a\\b.mp4"));
        assert!(!is_valid_scratch_name(".."));
    }

    #[test]
    fn progress_fraction_clamps() {
        assert_eq!(progress_fraction(5_000_000, 10.0), 0.5);
        assert_eq!(progress_fraction(20_000_000, 10.0), 1.0);
        assert_eq!(progress_fraction(-1, 10.0), 0.0);
        assert_eq!(progress_fraction(1, 0.0), 0.0);
    }

    #[test]
    fn progress_protocol_lines_are_not_logs() {
        assert!(is_progress_protocol_line("frame=120"));
        assert!(is_progress_protocol_line("speed=3.1x"));
        assert!(is_progress_protocol_line("stream_0_0_q=28.0"));
        assert!(!is_progress_protocol_line("Press [q] to stop"));
        assert!(!is_progress_protocol_line("Error opening input"));
    }

    #[tokio::test]
    async fn write_before_init_fails() {
        let registry = ToolRegistry::discover(&Default::default());
        let mut engine = FfmpegEngine::new(registry);
        let err = engine.write_file("input_0.mp4", b"x").await.unwrap_err();
        assert!(matches!(err, Error::EngineInit(_)));
    }

    #[tokio::test]
    async fn scratch_file_lifecycle() {
        let registry = ToolRegistry::discover(&Default::default());
        let mut engine = FfmpegEngine::new(registry);
        if engine.init().await.is_err() {
            // ffmpeg unavailable in this environment; skip.
            return;
        }
        assert!(engine.loaded());

        engine.write_file("input_0.mp4", b"abc").await.unwrap();
        assert_eq!(engine.read_file("input_0.mp4").await.unwrap(), b"abc");
        engine.delete_file("input_0.mp4").await.unwrap();
        assert!(engine.read_file("input_0.mp4").await.is_err());

        // Init is idempotent once loaded.
        engine.init().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_name_rejected_even_when_loaded() {
        let registry = ToolRegistry::discover(&Default::default());
        let mut engine = FfmpegEngine::new(registry);
        if engine.init().await.is_err() {
            return;
        }
        let err = engine.write_file("../escape", b"x").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
