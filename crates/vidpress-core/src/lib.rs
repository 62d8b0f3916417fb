//! Shared foundation for the vidpress workspace.
//!
//! This crate provides:
//!
//! - **Error handling**: the unified [`Error`] enum and [`Result`] alias that
//!   every other crate funnels its failures into
//! - **Configuration**: the JSON [`Config`] with per-section defaults so an
//!   empty `{}` file is valid
//! - **Events**: [`BatchEvent`] lifecycle notifications and the
//!   [`EventSender`] callback wrapper used to surface batch progress

pub mod config;
pub mod error;
pub mod events;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{BatchEvent, EventSender};
