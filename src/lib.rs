//! # framesplit
//!
//! Split a video into still-frame image files using several decode workers
//! running in parallel.
//!
//! The frame index space `[0, total_frames)` is divided into contiguous,
//! disjoint ranges, one per worker. Each worker opens its own FFmpeg
//! decoder (via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)),
//! seeks to the start of its range, writes every Nth frame with the
//! [`image`](https://crates.io/crates/image) crate, and bumps a shared
//! progress counter that drives a terminal progress bar.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesplit::{ExtractionConfig, FrameExtractor};
//!
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_save_dir("frames")
//!     .with_frame_interval(5)
//!     .with_workers(4);
//!
//! // Frames land in frames/input/frame_0000.png, frame_0005.png, ...
//! let summary = FrameExtractor::new(config)?.run()?;
//! assert!(summary.is_complete());
//! # Ok::<(), framesplit::ExtractError>(())
//! ```
//!
//! ## Partitioning
//!
//! ```
//! let plan = framesplit::partition(10, 3)?;
//! assert_eq!(plan.boundaries(), &[0, 3, 6, 10]);
//! # Ok::<(), framesplit::ExtractError>(())
//! ```
//!
//! ## Custom sources
//!
//! Anything implementing [`SourceFactory`] can feed the workers, which is
//! how the test suite drives extraction without FFmpeg fixtures.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FrameExtractor::run_async` via Tokio's blocking pool |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod metadata;
pub mod output;
pub mod partition;
pub mod progress;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
mod utilities;
pub mod video;
pub mod worker;

pub use config::{DEFAULT_WORKERS, ExtractionConfig};
pub use error::ExtractError;
pub use extractor::{ExtractionHandle, ExtractionSummary, FrameExtractor};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use output::{ImageFormat, frame_file_name, output_directory, padding_width};
pub use partition::{PartitionPlan, partition};
pub use progress::{
    CancellationToken, DEFAULT_BAR_WIDTH, LineRenderer, ProgressCallback, ProgressCounter,
    ProgressInfo, ProgressRenderer, format_bar,
};
pub use source::{SourceFactory, VideoSource};
#[cfg(feature = "async")]
pub use stream::ExtractionFuture;
pub use video::{FfmpegSource, FfmpegSourceFactory};
pub use worker::WorkerReport;
