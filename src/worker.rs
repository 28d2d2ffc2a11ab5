//! A single extraction worker.
//!
//! A worker owns one half-open range `[start, stop)` of a
//! [`PartitionPlan`](crate::PartitionPlan). It opens a private source,
//! positions it at `start` (seeking when possible, decoding and discarding
//! the prefix otherwise), then visits every frame of its range: frames whose
//! index is a multiple of the sampling interval are written to disk, and
//! every visited frame bumps the shared [`ProgressCounter`].
//!
//! Per-frame decode and write failures are logged and counted in the
//! [`WorkerReport`]; they never stop the worker.

use std::{ops::Range, path::PathBuf, sync::Arc};

use image::DynamicImage;

use crate::{
    error::ExtractError,
    output::{ImageFormat, frame_file_name},
    progress::{CancellationToken, ProgressCounter},
    source::{SourceFactory, VideoSource},
};

/// What one worker did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Index of the worker in the partition plan.
    pub worker: usize,
    /// The frame range the worker was assigned.
    pub range: Range<u64>,
    /// Frames of the range visited (and counted).
    pub frames_visited: u64,
    /// Frames written to disk.
    pub frames_written: u64,
    /// Frames inside the range that failed to decode.
    pub decode_failures: u64,
    /// Sampled frames that failed to encode or write.
    pub write_failures: u64,
    /// The stream ended before the end of the range.
    pub ended_early: bool,
    /// The range start was reached by seeking rather than decoding.
    pub seeked: bool,
}

impl WorkerReport {
    fn new(worker: usize, range: Range<u64>) -> Self {
        Self {
            worker,
            range,
            frames_visited: 0,
            frames_written: 0,
            decode_failures: 0,
            write_failures: 0,
            ended_early: false,
            seeked: false,
        }
    }
}

/// Settings and shared state handed to every worker of a job.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) output_dir: PathBuf,
    pub(crate) total_frames: u64,
    pub(crate) frame_interval: u64,
    pub(crate) image_format: ImageFormat,
    pub(crate) seek: bool,
    pub(crate) progress: Arc<ProgressCounter>,
    pub(crate) cancellation: CancellationToken,
}

/// Extract the frames of `range` and report what happened.
///
/// # Errors
///
/// - Any error from opening the source.
/// - [`ExtractError::Cancelled`] if the job's token is cancelled.
pub(crate) fn run_worker<F: SourceFactory>(
    worker: usize,
    range: Range<u64>,
    factory: &F,
    context: &WorkerContext,
) -> Result<WorkerReport, ExtractError> {
    let mut report = WorkerReport::new(worker, range.clone());

    if range.is_empty() {
        log::debug!("Worker {worker}: empty range, nothing to do");
        return Ok(report);
    }

    log::debug!(
        "Worker {worker}: frames {}..{} of {}",
        range.start,
        range.end,
        factory.describe(),
    );

    // The source is dropped (and its decoder released) on every return path.
    let Some(mut source) = position_at_start(worker, range.start, factory, context, &mut report)?
    else {
        report.ended_early = true;
        return Ok(report);
    };

    for frame_number in range {
        if context.cancellation.is_cancelled() {
            log::debug!("Worker {worker}: cancelled at frame {frame_number}");
            return Err(ExtractError::Cancelled);
        }

        match source.next_frame() {
            Ok(Some(frame)) => {
                if frame_number % context.frame_interval == 0 {
                    write_frame(worker, frame_number, &frame, context, &mut report);
                }
            }
            Ok(None) => {
                log::debug!("Worker {worker}: stream ended at frame {frame_number}");
                report.ended_early = true;
                break;
            }
            Err(error) => {
                log::warn!("Worker {worker}: frame {frame_number} skipped: {error}");
                report.decode_failures += 1;
            }
        }

        report.frames_visited += 1;
        context.progress.increment(worker, frame_number);
    }

    log::debug!(
        "Worker {worker}: done, {} visited, {} written",
        report.frames_visited,
        report.frames_written,
    );
    Ok(report)
}

/// Open a source whose next frame is `start`.
///
/// Returns `None` if the stream ends before `start` is reached.
fn position_at_start<F: SourceFactory>(
    worker: usize,
    start: u64,
    factory: &F,
    context: &WorkerContext,
    report: &mut WorkerReport,
) -> Result<Option<F::Source>, ExtractError> {
    let mut source = factory.open()?;
    if start == 0 {
        return Ok(Some(source));
    }

    if context.seek && source.can_seek() {
        match source.seek_to_frame(start) {
            Ok(()) => {
                report.seeked = true;
                return Ok(Some(source));
            }
            Err(error) => {
                log::warn!(
                    "Worker {worker}: seek to frame {start} failed ({error}), decoding from frame 0"
                );
                // The failed seek may have left the cursor anywhere.
                source = factory.open()?;
            }
        }
    }

    for frame_number in 0..start {
        if context.cancellation.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        match source.next_frame() {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::debug!("Worker {worker}: stream ended at frame {frame_number}, before range");
                return Ok(None);
            }
            Err(error) => {
                log::debug!("Worker {worker}: discarded frame {frame_number} failed: {error}");
            }
        }
    }

    Ok(Some(source))
}

fn write_frame(
    worker: usize,
    frame_number: u64,
    frame: &DynamicImage,
    context: &WorkerContext,
    report: &mut WorkerReport,
) {
    let path = context.output_dir.join(frame_file_name(
        frame_number,
        context.total_frames,
        context.image_format,
    ));

    match frame.save_with_format(&path, context.image_format.to_image_format()) {
        Ok(()) => report.frames_written += 1,
        Err(error) => {
            log::warn!(
                "Worker {worker}: failed to write {}: {error}",
                path.display()
            );
            report.write_failures += 1;
        }
    }
}
