//! Error types for the `framesplit` crate.
//!
//! [`ExtractError`] is the single error type returned by every fallible
//! operation. Argument errors surface synchronously, before any worker is
//! started; per-frame decode and write failures never reach this type at
//! all (workers log and count them, see [`WorkerReport`](crate::WorkerReport)).

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesplit` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// An argument was outside its accepted domain.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the source factory.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// Neither the container nor the stream reports a usable frame count.
    #[error("Could not determine the frame count of {0}")]
    UnknownFrameCount(PathBuf),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The source cannot reposition its decode cursor.
    #[error("Video source does not support seeking")]
    SeekUnsupported,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The job was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A worker thread panicked before reporting back.
    #[error("Worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker in the partition plan.
        worker: usize,
    },

    /// The background task driving an async job panicked.
    #[error("Extraction task panicked")]
    TaskPanicked,
}

impl ExtractError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ExtractError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

impl From<FfmpegError> for ExtractError {
    fn from(error: FfmpegError) -> Self {
        ExtractError::FfmpegError(error.to_string())
    }
}
