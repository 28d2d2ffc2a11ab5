//! Progress reporting and cancellation support.
//!
//! Every worker shares one [`ProgressCounter`]. Each visited frame bumps
//! the counter under a mutex; while the lock is still held the counter
//! redraws the configured [`ProgressRenderer`] and, every `batch_size`
//! increments, notifies the [`ProgressCallback`]. Holding the lock across
//! both keeps printed values monotonic and lines non-interleaved.
//!
//! [`CancellationToken`] lets a caller stop all workers cooperatively; they
//! check it once per frame.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesplit::{ExtractionConfig, FrameExtractor, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("worker {} at frame {}: {:.1}%", info.worker, info.current_frame, info.percentage);
//!     }
//! }
//!
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_show_progress(false)
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(100);
//! FrameExtractor::new(config)?.run()?;
//! # Ok::<(), framesplit::ExtractError>(())
//! ```

use std::io::{self, Write};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// Width of the default terminal bar, in characters.
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames visited so far across all workers.
    pub current: u64,
    /// Total frames the job expects to visit.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time since the counter was created.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Index of the worker that triggered this report.
    pub worker: usize,
    /// The frame that worker just visited.
    pub current_frame: u64,
}

/// Trait for receiving progress updates during extraction.
///
/// Callbacks run on worker threads while the shared counter is locked, so
/// they must be [`Send`] + [`Sync`] and should return quickly.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once more when the job ends.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Draws the aggregate progress somewhere visible.
///
/// Implementations need not be internally synchronized: the
/// [`ProgressCounter`] only calls them while holding its lock.
pub trait ProgressRenderer: Send + Sync {
    /// Redraw for `current` of `total` frames.
    fn render(&self, current: u64, total: u64);

    /// Called once after every worker has been joined.
    fn finish(&self) {}
}

/// Format a fixed-width progress bar followed by a `current/total` label.
///
/// The fill is clamped to 100% when `current > total`.
///
/// ```
/// assert_eq!(framesplit::format_bar(5, 10, 10), "[=====-----] 5/10");
/// ```
pub fn format_bar(current: u64, total: u64, width: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (current as f64 / total as f64).min(1.0)
    };
    let filled = (ratio * width as f64) as usize;

    let mut line = String::with_capacity(width + 24);
    line.push('[');
    line.extend(std::iter::repeat_n('=', filled));
    line.extend(std::iter::repeat_n('-', width - filled));
    line.push(']');
    line.push_str(&format!(" {current}/{total}"));
    line
}

/// Overwrites the current stdout line with a [`format_bar`] bar.
///
/// Each redraw starts with a carriage return and emits no newline, so
/// successive calls update the bar in place.
#[derive(Debug, Clone)]
pub struct LineRenderer {
    width: usize,
}

impl LineRenderer {
    /// Renderer with the default 40-character bar.
    pub fn new() -> Self {
        Self {
            width: DEFAULT_BAR_WIDTH,
        }
    }

    /// Use a custom bar width.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

impl Default for LineRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRenderer for LineRenderer {
    fn render(&self, current: u64, total: u64) {
        let mut stdout = io::stdout().lock();
        // Terminal output is best-effort.
        let _ = write!(stdout, "\r{}", format_bar(current, total, self.width));
        let _ = stdout.flush();
    }

    fn finish(&self) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout);
    }
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone it freely; cancelling any clone is observed by all of them.
///
/// ```
/// use framesplit::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_view = token.clone();
/// token.cancel();
/// assert!(worker_view.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The progress counter shared by every worker of a job.
///
/// Starts at zero, only ever increases, and reaches `total` once every
/// frame of every range has been visited.
pub struct ProgressCounter {
    current: Mutex<u64>,
    total: u64,
    renderer: Option<Arc<dyn ProgressRenderer>>,
    callback: Arc<dyn ProgressCallback>,
    batch_size: u64,
    start_time: Instant,
}

impl ProgressCounter {
    /// A silent counter expecting `total` increments.
    pub fn new(total: u64) -> Self {
        Self {
            current: Mutex::new(0),
            total,
            renderer: None,
            callback: Arc::new(NoOpProgress),
            batch_size: 1,
            start_time: Instant::now(),
        }
    }

    /// Redraw `renderer` after every increment.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ProgressRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Notify `callback` every `batch_size` increments (minimum 1).
    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>, batch_size: u64) -> Self {
        self.callback = callback;
        self.batch_size = batch_size.max(1);
        self
    }

    /// Record one visited frame and return the new aggregate count.
    ///
    /// Rendering and callback delivery happen before the lock is released.
    pub fn increment(&self, worker: usize, frame_number: u64) -> u64 {
        // The guarded integer is always valid, so a panic elsewhere while
        // holding the lock does not invalidate it.
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += 1;
        let value = *current;

        if let Some(renderer) = &self.renderer {
            renderer.render(value, self.total);
        }
        if value % self.batch_size == 0 || value == self.total {
            self.callback
                .on_progress(&self.snapshot(value, worker, frame_number));
        }

        value
    }

    /// The current aggregate count.
    pub fn current(&self) -> u64 {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The count the job expects to reach.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Let the renderer close its line after all workers are done.
    pub(crate) fn finish(&self) {
        let _guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(renderer) = &self.renderer {
            renderer.finish();
        }
    }

    fn snapshot(&self, current: u64, worker: usize, frame_number: u64) -> ProgressInfo {
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (current as f32 / self.total as f32) * 100.0
        } else {
            100.0
        };

        ProgressInfo {
            current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining: estimate_remaining(elapsed, current, self.total),
            worker,
            current_frame: frame_number,
        }
    }
}

/// Linear extrapolation of the time left at the current throughput.
fn estimate_remaining(elapsed: Duration, current: u64, total: u64) -> Option<Duration> {
    if current == 0 {
        return None;
    }
    let remaining = total.saturating_sub(current);
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * remaining as f64 / current as f64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_time_scales_with_progress() {
        let elapsed = Duration::from_secs(10);
        assert_eq!(estimate_remaining(elapsed, 0, 100), None);
        assert_eq!(estimate_remaining(elapsed, 25, 100), Some(Duration::from_secs(30)));
        assert_eq!(estimate_remaining(elapsed, 100, 100), Some(Duration::ZERO));
    }

    #[test]
    fn remaining_time_survives_counts_beyond_u32() {
        let current = 1_u64 << 32;
        let estimate = estimate_remaining(Duration::from_secs(8), current, current * 2);
        assert_eq!(estimate, Some(Duration::from_secs(8)));
    }

    #[test]
    fn bar_is_empty_at_zero() {
        assert_eq!(
            format_bar(0, 4, DEFAULT_BAR_WIDTH),
            format!("[{}] 0/4", "-".repeat(40))
        );
    }

    #[test]
    fn bar_fill_truncates() {
        // 1/3 of 10 is 3.33 -> 3 cells.
        assert_eq!(format_bar(1, 3, 10), "[===-------] 1/3");
    }

    #[test]
    fn bar_clamps_overflow() {
        assert_eq!(format_bar(12, 10, 4), "[====] 12/10");
    }

    #[test]
    fn counter_starts_at_zero() {
        let counter = ProgressCounter::new(7);
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.total(), 7);
        assert_eq!(counter.increment(0, 0), 1);
        assert_eq!(counter.current(), 1);
    }
}
