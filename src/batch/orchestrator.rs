//! The batch orchestrator.
//!
//! Given an ordered list of [`Job`]s and one shared [`CompressionParameters`],
//! produces one [`CompressionResult`] per job by delegating transcoding to an
//! [`Engine`], strictly sequentially. The engine is a single shared stateful
//! resource (one scratch namespace, one execution context) and must never be
//! invoked concurrently; holding it behind `&mut self` makes that a
//! compile-time guarantee.
//!
//! Failure policy: the first failing step aborts the whole batch. Jobs after
//! the failing index are never attempted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidpress_core::{BatchEvent, Error, EventSender, Result};
use vidpress_engine::Engine;

use super::types::{BatchState, CompressionParameters, CompressionResult, Job, SelectedFile};

/// File extensions treated as video media types.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "wmv", "flv", "mpg", "mpeg", "ts", "3gp",
];

/// Check if a path has a video file extension.
pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Filter `paths` down to video-typed files, preserving input order.
///
/// # Errors
///
/// - [`Error::NoValidFiles`] if no input is video-typed.
/// - [`Error::FileNotFound`] if a video-typed input does not exist.
pub fn select_video_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    let mut selected = Vec::new();

    for path in paths {
        if !is_video_path(path) {
            tracing::debug!("skipping non-video input: {}", path.display());
            continue;
        }

        let meta = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path)
            } else {
                Error::Io(e)
            }
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        selected.push(SelectedFile {
            path: path.clone(),
            name,
            size_bytes: meta.len(),
        });
    }

    if selected.is_empty() {
        return Err(Error::NoValidFiles);
    }

    Ok(selected)
}

/// Engine-namespace name for job `index`'s input.
fn input_name(index: usize) -> String {
    format!("input_{index}.mp4")
}

/// Engine-namespace name for job `index`'s output.
fn output_name(index: usize) -> String {
    format!("output_{index}.mp4")
}

/// The fixed engine argument template for one job: scale to the target
/// dimensions, H.264 at the target bitrate with 1.5x maxrate and 2x buffer,
/// medium preset.
fn transcode_args(index: usize, params: &CompressionParameters) -> Vec<String> {
    let bitrate = params.bitrate_kbps;
    vec![
        "-i".into(),
        input_name(index),
        "-vf".into(),
        format!("scale={}:{}", params.width, params.height),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        format!("{bitrate}k"),
        "-maxrate".into(),
        format!("{}k", bitrate as f64 * 1.5),
        "-bufsize".into(),
        format!("{}k", bitrate * 2),
        "-preset".into(),
        "medium".into(),
        output_name(index),
    ]
}

/// Drives batches of compression jobs through an [`Engine`].
///
/// Owns the engine exclusively for its lifetime, the current [`BatchState`],
/// and the results of the most recent batch. Results survive a failed batch
/// (the completed prefix) and are cleared when the next batch starts.
pub struct Orchestrator<E: Engine> {
    engine: E,
    events: Arc<EventSender>,
    state: BatchState,
    results: Vec<CompressionResult>,
}

impl<E: Engine> Orchestrator<E> {
    /// Create an orchestrator that reports no events.
    pub fn new(engine: E) -> Self {
        Self::with_events(engine, EventSender::noop())
    }

    /// Create an orchestrator reporting lifecycle events through `events`.
    pub fn with_events(engine: E, events: EventSender) -> Self {
        Self {
            engine,
            events: Arc::new(events),
            state: BatchState::Idle,
            results: Vec::new(),
        }
    }

    /// Current batch state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Results of the most recent batch: the full set after success, the
    /// completed prefix after a failure.
    pub fn results(&self) -> &[CompressionResult] {
        &self.results
    }

    fn transition(&mut self, next: BatchState) {
        let advanced = self.state.advance(next);
        debug_assert!(advanced, "illegal batch state transition to {next:?}");
        if !advanced {
            tracing::error!("illegal batch state transition to {next:?}; forcing");
            self.state = next;
        }
    }

    /// Run one batch to completion or first failure.
    ///
    /// Jobs are processed strictly in input order, one at a time. On success
    /// the state is [`BatchState::Done`] and [`results`](Self::results) holds
    /// one entry per job; on failure the state is [`BatchState::Failed`], the
    /// error is returned, and results hold the jobs completed before the
    /// failure.
    pub async fn run_batch(
        &mut self,
        jobs: &[Job],
        params: &CompressionParameters,
    ) -> Result<()> {
        params.validate()?;
        if jobs.is_empty() {
            return Err(Error::NoValidFiles);
        }

        // A new batch replaces whatever the previous one left behind.
        self.state = BatchState::Idle;
        self.results.clear();
        self.events.send(BatchEvent::BatchStarted { total: jobs.len() });

        match self.run_inner(jobs, params).await {
            Ok(()) => {
                self.transition(BatchState::Done);
                self.events.send(BatchEvent::BatchCompleted { total: jobs.len() });
                Ok(())
            }
            Err(e) => {
                self.transition(BatchState::Failed);
                self.events.send(BatchEvent::BatchFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self, jobs: &[Job], params: &CompressionParameters) -> Result<()> {
        self.transition(BatchState::LoadingEngine);
        if !self.engine.loaded() {
            self.events.send(BatchEvent::EngineLoading);
        }
        self.engine.init().await?;

        self.engine.set_log_handler(Box::new(|line| {
            tracing::debug!(target: "vidpress::engine", "{line}");
        }));

        for (index, job) in jobs.iter().enumerate() {
            self.transition(BatchState::Running { index });
            tracing::info!("processing video {}/{}: {}", index + 1, jobs.len(), job.name);
            self.events.send(BatchEvent::JobStarted {
                index,
                name: job.name.clone(),
            });
            // Progress restarts from zero for every job.
            self.events.send(BatchEvent::JobProgress { index, percent: 0 });

            let events = Arc::clone(&self.events);
            self.engine.set_progress_handler(Box::new(move |fraction| {
                let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
                events.send(BatchEvent::JobProgress { index, percent });
            }));

            let input = input_name(index);
            let output = output_name(index);

            match self.process_job(index, job, params, &input, &output).await {
                Ok(result) => {
                    self.cleanup(&input, &output)
                        .await
                        .map_err(|e| Error::cleanup(index, e.to_string()))?;
                    self.events.send(BatchEvent::JobCompleted {
                        index,
                        output_bytes: result.size_bytes,
                    });
                    self.results.push(result);
                }
                Err(e) => {
                    // Scratch files must not leak into later batches even on
                    // failure; the step's own error still wins.
                    if let Err(cleanup_err) = self.cleanup(&input, &output).await {
                        tracing::warn!(
                            "cleanup after failed video {} incomplete: {cleanup_err}",
                            index + 1
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Write, transcode, and read back one job.
    async fn process_job(
        &mut self,
        index: usize,
        job: &Job,
        params: &CompressionParameters,
        input: &str,
        output: &str,
    ) -> Result<CompressionResult> {
        let data = tokio::fs::read(&job.path).await.map_err(|e| {
            Error::transcode(index, format!("failed to read {}: {e}", job.path.display()))
        })?;

        self.engine
            .write_file(input, &data)
            .await
            .map_err(|e| Error::transcode(index, e.to_string()))?;

        let args = transcode_args(index, params);
        self.engine
            .exec(&args, Some(job.metadata.duration_secs))
            .await
            .map_err(|e| Error::transcode(index, e.to_string()))?;

        let compressed = self
            .engine
            .read_file(output)
            .await
            .map_err(|e| Error::transcode(index, e.to_string()))?;

        let size_bytes = compressed.len() as u64;
        tracing::debug!(
            "video {} compressed: {} -> {} bytes",
            index + 1,
            job.size_bytes,
            size_bytes
        );

        Ok(CompressionResult {
            original_name: job.name.clone(),
            data: compressed,
            size_bytes,
        })
    }

    /// Remove both of a job's scratch files. Files that never came to exist
    /// (a job that failed before producing output) are not an error.
    async fn cleanup(&mut self, input: &str, output: &str) -> Result<()> {
        self.remove_scratch(input).await?;
        self.remove_scratch(output).await?;
        Ok(())
    }

    async fn remove_scratch(&mut self, name: &str) -> Result<()> {
        match self.engine.delete_file(name).await {
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
