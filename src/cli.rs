use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidpress")]
#[command(author, version, about = "Batch video compression tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress one or more video files sequentially
    Compress {
        /// Video files to compress
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Target video bitrate in kbps (minimum 100)
        #[arg(long)]
        bitrate: Option<u32>,

        /// Directory compressed files are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Probe a video file and display its metadata
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}
