//! Extraction configuration.
//!
//! [`ExtractionConfig`] is a builder carrying everything a job needs: the
//! input path, where frames go, how densely to sample, how many workers to
//! run, and the optional progress and cancellation hooks.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{CancellationToken, ExtractionConfig, ImageFormat};
//!
//! let token = CancellationToken::new();
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_save_dir("frames")
//!     .with_frame_interval(10)
//!     .with_workers(8)
//!     .with_image_format(ImageFormat::Jpeg)
//!     .with_cancellation(token.clone());
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::ExtractError,
    output::ImageFormat,
    progress::{CancellationToken, LineRenderer, NoOpProgress, ProgressCallback, ProgressRenderer},
};

/// Number of workers used when none is configured.
pub const DEFAULT_WORKERS: usize = 5;

/// Configuration for a frame extraction job.
///
/// Defaults: save into the current directory, write every frame as PNG,
/// five workers, terminal progress bar on, seek when the source can.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) video_path: PathBuf,
    pub(crate) save_dir: PathBuf,
    pub(crate) frame_interval: u64,
    pub(crate) show_progress: bool,
    pub(crate) workers: usize,
    pub(crate) image_format: ImageFormat,
    pub(crate) seek: bool,
    pub(crate) renderer: Arc<dyn ProgressRenderer>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    pub(crate) cancellation: CancellationToken,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("video_path", &self.video_path)
            .field("save_dir", &self.save_dir)
            .field("frame_interval", &self.frame_interval)
            .field("show_progress", &self.show_progress)
            .field("workers", &self.workers)
            .field("image_format", &self.image_format)
            .field("seek", &self.seek)
            .field("batch_size", &self.batch_size)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ExtractionConfig {
    /// Create a configuration for `video_path` with default settings.
    pub fn new<P: AsRef<Path>>(video_path: P) -> Self {
        Self {
            video_path: video_path.as_ref().to_path_buf(),
            save_dir: PathBuf::from("."),
            frame_interval: 1,
            show_progress: true,
            workers: DEFAULT_WORKERS,
            image_format: ImageFormat::default(),
            seek: true,
            renderer: Arc::new(LineRenderer::new()),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
            cancellation: CancellationToken::new(),
        }
    }

    /// Base output directory. Frames go into `save_dir/<video stem>/`.
    #[must_use]
    pub fn with_save_dir<P: AsRef<Path>>(mut self, save_dir: P) -> Self {
        self.save_dir = save_dir.as_ref().to_path_buf();
        self
    }

    /// Write only frames whose index is a multiple of `interval`.
    ///
    /// Every frame is still decoded and counted.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: u64) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Enable or disable the terminal progress bar.
    #[must_use]
    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Number of concurrent workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Image format of written frames.
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Allow workers to seek to their range start.
    ///
    /// When `false`, or when the source cannot seek, each worker decodes and
    /// discards every frame before its range.
    #[must_use]
    pub fn with_seek(mut self, seek: bool) -> Self {
        self.seek = seek;
        self
    }

    /// Replace the terminal renderer used when progress is shown.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ProgressRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The input video path.
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// The configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Reject settings no job can run with.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidArgument`] for an empty video path, a
    /// zero frame interval, or zero workers.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.video_path.as_os_str().is_empty() {
            return Err(ExtractError::invalid("video_path", "must not be empty"));
        }
        if self.frame_interval == 0 {
            return Err(ExtractError::invalid(
                "frame_interval",
                "must be greater than 0",
            ));
        }
        if self.workers == 0 {
            return Err(ExtractError::invalid("workers", "must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExtractionConfig::new("clip.mp4");
        assert_eq!(config.frame_interval, 1);
        assert!(config.show_progress);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.image_format, ImageFormat::Png);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = ExtractionConfig::new("clip.mp4").with_frame_interval(0);
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidArgument { name: "frame_interval", .. })
        ));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ExtractionConfig::new("clip.mp4").with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidArgument { name: "workers", .. })
        ));
    }

    #[test]
    fn debug_elides_callbacks() {
        let debug = format!("{:?}", ExtractionConfig::new("clip.mp4").with_batch_size(0));
        assert!(debug.contains("ExtractionConfig"));
        assert!(debug.contains("batch_size: 1"));
    }
}
