//! # vidpress-engine
//!
//! The external-engine boundary of vidpress.
//!
//! This crate provides:
//! - The [`Engine`] contract trait: initialize once, write/read/delete named
//!   files in a private scratch namespace, and execute the engine with an
//!   argument list while streaming log lines and fractional progress
//! - [`FfmpegEngine`], the ffmpeg-backed implementation
//! - [`ToolCommand`], a timeout-guarded subprocess builder
//! - [`ToolRegistry`], ffmpeg/ffprobe discovery via `PATH` or config overrides
//! - [`probe`], ffprobe-backed video metadata extraction
//!
//! The engine is a single shared stateful resource: every operation takes
//! `&mut self`, so serialized access is a compile-time guarantee.
//!
//! ## Example
//!
//! ```no_run
//! use vidpress_engine::{Engine, FfmpegEngine, ToolRegistry};
//!
//! # async fn example() -> vidpress_core::Result<()> {
//! let registry = ToolRegistry::discover(&Default::default());
//! let mut engine = FfmpegEngine::new(registry);
//! engine.init().await?;
//! engine.write_file("input_0.mp4", b"...").await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod engine;
pub mod probe;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use engine::{Engine, FfmpegEngine, LogHandler, ProgressHandler};
pub use probe::{extract_metadata, VideoMetadata};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
