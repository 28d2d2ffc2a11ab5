//! Job orchestration.
//!
//! [`FrameExtractor`] validates the configuration, learns the frame count,
//! computes the [`PartitionPlan`] and prepares the output directory. No
//! decoding happens until [`start`](FrameExtractor::start), which launches
//! one OS thread per partition and returns an [`ExtractionHandle`].
//! [`join`](ExtractionHandle::join) waits for every worker before reporting.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{ExtractionConfig, FrameExtractor};
//!
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_save_dir("frames")
//!     .with_workers(4);
//!
//! let extractor = FrameExtractor::new(config)?;
//! println!("{} frames -> {}", extractor.total_frames(), extractor.output_dir().display());
//!
//! let handle = extractor.start()?;
//! let summary = handle.join()?;
//! println!("wrote {} frames", summary.frames_written);
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    config::ExtractionConfig,
    error::ExtractError,
    output::{output_directory, prepare_directory},
    partition::{PartitionPlan, partition},
    progress::{CancellationToken, ProgressCounter},
    source::SourceFactory,
    video::FfmpegSourceFactory,
    worker::{WorkerContext, WorkerReport, run_worker},
};

/// A prepared, not yet started extraction job.
pub struct FrameExtractor<F: SourceFactory = FfmpegSourceFactory> {
    config: ExtractionConfig,
    factory: Arc<F>,
    total_frames: u64,
    plan: PartitionPlan,
    output_dir: PathBuf,
}

impl FrameExtractor<FfmpegSourceFactory> {
    /// Prepare a job decoding `config.video_path` with FFmpeg.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidArgument`] for invalid settings.
    /// - [`ExtractError::FileOpen`] / [`ExtractError::NoVideoStream`] if the
    ///   video cannot be probed.
    /// - [`ExtractError::UnknownFrameCount`] if no frame count is available.
    /// - [`ExtractError::IoError`] if the output directory cannot be created.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let factory = FfmpegSourceFactory::new(&config.video_path)?;
        Self::with_factory(config, factory)
    }
}

impl<F: SourceFactory> FrameExtractor<F> {
    /// Prepare a job that decodes through `factory`.
    pub fn with_factory(config: ExtractionConfig, factory: F) -> Result<Self, ExtractError> {
        config.validate()?;

        let total_frames = factory.frame_count()?;
        let plan = partition(
            i64::try_from(total_frames).unwrap_or(i64::MAX),
            i64::try_from(config.workers).unwrap_or(i64::MAX),
        )?;

        let output_dir = output_directory(&config.save_dir, &config.video_path)?;
        prepare_directory(&output_dir)?;

        log::debug!(
            "Prepared {}: {total_frames} frames, boundaries {:?}",
            factory.describe(),
            plan.boundaries(),
        );

        Ok(Self {
            config,
            factory: Arc::new(factory),
            total_frames,
            plan,
            output_dir,
        })
    }

    /// Total frames the job will visit.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// The per-worker frame ranges.
    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    /// Directory frames are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The configuration the job was prepared with.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Launch one worker thread per partition.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::IoError`] if a thread cannot be spawned. Any
    /// workers already running are cancelled and joined first.
    pub fn start(self) -> Result<ExtractionHandle, ExtractError> {
        let mut counter = ProgressCounter::new(self.total_frames)
            .with_callback(Arc::clone(&self.config.progress), self.config.batch_size);
        if self.config.show_progress {
            counter = counter.with_renderer(Arc::clone(&self.config.renderer));
        }
        let progress = Arc::new(counter);
        let cancellation = self.config.cancellation.clone();

        let context = WorkerContext {
            output_dir: self.output_dir.clone(),
            total_frames: self.total_frames,
            frame_interval: self.config.frame_interval,
            image_format: self.config.image_format,
            seek: self.config.seek,
            progress: Arc::clone(&progress),
            cancellation: cancellation.clone(),
        };

        let mut workers = Vec::with_capacity(self.plan.worker_count());
        for (index, range) in self.plan.ranges().enumerate() {
            let factory = Arc::clone(&self.factory);
            let context = context.clone();
            let spawned = thread::Builder::new()
                .name(format!("framesplit-worker-{index}"))
                .spawn(move || run_worker(index, range, factory.as_ref(), &context));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(error) => {
                    cancellation.cancel();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(ExtractError::IoError(error));
                }
            }
        }

        log::debug!("Started {} workers", workers.len());

        Ok(ExtractionHandle {
            workers,
            progress,
            cancellation,
            output_dir: self.output_dir,
            total_frames: self.total_frames,
            show_progress: self.config.show_progress,
            started: Instant::now(),
        })
    }

    /// Start the job and wait for it to finish.
    pub fn run(self) -> Result<ExtractionSummary, ExtractError> {
        self.start()?.join()
    }
}

/// Outcome of a finished job.
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    /// Frame count the job was partitioned over.
    pub total_frames: u64,
    /// Final value of the shared progress counter.
    pub frames_visited: u64,
    /// Frames written to disk across all workers.
    pub frames_written: u64,
    /// Frames that failed to decode.
    pub decode_failures: u64,
    /// Sampled frames that failed to write.
    pub write_failures: u64,
    /// Directory the frames were written into.
    pub output_dir: PathBuf,
    /// Wall-clock time from start to the last join.
    pub elapsed: Duration,
    /// Per-worker reports, in plan order.
    pub workers: Vec<WorkerReport>,
}

impl ExtractionSummary {
    /// Whether every frame of the plan was visited.
    pub fn is_complete(&self) -> bool {
        self.frames_visited == self.total_frames
    }
}

/// Handle to a running job.
///
/// Dropping the handle without joining leaves the workers running
/// detached.
pub struct ExtractionHandle {
    workers: Vec<JoinHandle<Result<WorkerReport, ExtractError>>>,
    progress: Arc<ProgressCounter>,
    cancellation: CancellationToken,
    output_dir: PathBuf,
    total_frames: u64,
    show_progress: bool,
    started: Instant,
}

impl ExtractionHandle {
    /// Frames visited so far across all workers.
    pub fn progress(&self) -> u64 {
        self.progress.current()
    }

    /// Whether every worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(JoinHandle::is_finished)
    }

    /// Ask every worker to stop at its next frame.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Wait for every worker and summarise the job.
    ///
    /// # Errors
    ///
    /// - The first worker error other than cancellation, if any.
    /// - [`ExtractError::Cancelled`] if the job was cancelled.
    /// - [`ExtractError::WorkerPanicked`] if a worker panicked.
    ///
    /// A failing worker cancels the rest of the job.
    pub fn join(self) -> Result<ExtractionSummary, ExtractError> {
        let mut reports = Vec::with_capacity(self.workers.len());
        let mut failure: Option<ExtractError> = None;

        for (index, handle) in self.workers.into_iter().enumerate() {
            let error = match handle.join() {
                Ok(Ok(report)) => {
                    reports.push(report);
                    continue;
                }
                Ok(Err(error)) => error,
                Err(_) => ExtractError::WorkerPanicked { worker: index },
            };

            if !matches!(error, ExtractError::Cancelled) {
                log::warn!("Worker {index} failed: {error}");
                self.cancellation.cancel();
            }
            failure = match failure {
                None | Some(ExtractError::Cancelled) => Some(error),
                kept => kept,
            };
        }

        if self.show_progress {
            self.progress.finish();
        }

        if let Some(error) = failure {
            return Err(error);
        }

        let summary = ExtractionSummary {
            total_frames: self.total_frames,
            frames_visited: self.progress.current(),
            frames_written: reports.iter().map(|r| r.frames_written).sum(),
            decode_failures: reports.iter().map(|r| r.decode_failures).sum(),
            write_failures: reports.iter().map(|r| r.write_failures).sum(),
            output_dir: self.output_dir,
            elapsed: self.started.elapsed(),
            workers: reports,
        };

        if summary.decode_failures + summary.write_failures > 0 {
            log::warn!(
                "{} frame(s) failed to decode, {} failed to write",
                summary.decode_failures,
                summary.write_failures,
            );
        }
        log::debug!(
            "Visited {}/{} frames, wrote {} in {:?}",
            summary.frames_visited,
            summary.total_frames,
            summary.frames_written,
            summary.elapsed,
        );

        Ok(summary)
    }
}
