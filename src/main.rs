mod cli;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use vidpress::batch::{select_video_files, CompressionParameters, Job, Orchestrator};
use vidpress::format::{format_file_size, reduction_percent};
use vidpress::output::save_all;
use vidpress_core::{BatchEvent, Config, EventSender};
use vidpress_engine::{extract_metadata, FfmpegEngine, ToolRegistry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidpress=trace,vidpress_engine=debug,vidpress_core=debug".to_string()
        } else {
            "vidpress=info,vidpress_engine=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Compress {
            inputs,
            width,
            height,
            bitrate,
            output_dir,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(compress_files(
                inputs,
                width,
                height,
                bitrate,
                output_dir,
                cli.config.as_deref(),
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Version => {
            println!("vidpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn compress_files(
    inputs: Vec<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    bitrate: Option<u32>,
    output_dir: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("config: {warning}");
    }

    let params = CompressionParameters {
        width: width.unwrap_or(config.defaults.width),
        height: height.unwrap_or(config.defaults.height),
        bitrate_kbps: bitrate.unwrap_or(config.defaults.bitrate_kbps),
    };
    // Refuse to start on invalid parameters, before any file is touched.
    params.validate()?;

    let selected = select_video_files(&inputs)?;
    println!("Selected {} video file(s)", selected.len());

    let registry = ToolRegistry::discover(&config.tools);

    let mut jobs = Vec::with_capacity(selected.len());
    for file in selected {
        let metadata = extract_metadata(&registry, &file.path).await?;
        println!(
            "  {} - {}x{}, {}, ~{} kbps",
            file.name,
            metadata.width,
            metadata.height,
            format_file_size(file.size_bytes),
            metadata.bitrate_kbps
        );
        jobs.push(Job::new(file, metadata));
    }

    let total = jobs.len();
    let events = EventSender::new(move |event| render_event(event, total));
    let engine = FfmpegEngine::new(registry);
    let mut orchestrator = Orchestrator::with_events(engine, events);
    orchestrator.run_batch(&jobs, &params).await?;

    println!();
    for (job, result) in jobs.iter().zip(orchestrator.results()) {
        println!("{}", job.name);
        println!(
            "  original:   {}x{}, {}, ~{} kbps",
            job.metadata.width,
            job.metadata.height,
            format_file_size(job.size_bytes),
            job.metadata.bitrate_kbps
        );
        println!(
            "  compressed: {}x{}, {}, {} kbps",
            params.width,
            params.height,
            format_file_size(result.size_bytes),
            params.bitrate_kbps
        );
        println!(
            "  size reduction: {:.2}%",
            reduction_percent(job.size_bytes, result.size_bytes)
        );
    }

    let out_dir = output_dir.unwrap_or(config.output.dir);
    let saved = save_all(orchestrator.results(), &out_dir).await?;
    println!("\nSaved {} file(s) to {}", saved.len(), out_dir.display());

    Ok(())
}

/// Render batch events as a live status line.
fn render_event(event: BatchEvent, total: usize) {
    use std::io::Write;

    match event {
        BatchEvent::EngineLoading => println!("Loading ffmpeg engine..."),
        BatchEvent::JobStarted { index, name } => {
            println!("Processing video {}/{}: {}", index + 1, total, name);
        }
        BatchEvent::JobProgress { percent, .. } => {
            print!("\r  [{percent:>3}%]");
            let _ = std::io::stdout().flush();
        }
        BatchEvent::JobCompleted { output_bytes, .. } => {
            println!("\r  [100%] done ({})", format_file_size(output_bytes));
        }
        BatchEvent::BatchCompleted { total } => {
            println!("All {total} video(s) compressed");
        }
        // The failure itself is rendered by the top-level error path.
        BatchEvent::BatchStarted { .. } | BatchEvent::BatchFailed { .. } => {}
    }
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);

    let metadata = extract_metadata(&registry, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        let size = std::fs::metadata(file)?.len();
        println!("File: {}", file.display());
        println!("Size: {}", format_file_size(size));
        println!("Duration: {:.2} s", metadata.duration_secs);
        println!("Dimensions: {}x{}", metadata.width, metadata.height);
        println!("Estimated bitrate: {} kbps", metadata.bitrate_kbps);
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable compression.");
    }

    Ok(())
}
