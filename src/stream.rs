//! Async wrapper around a blocking extraction job.
//!
//! [`ExtractionFuture`] runs [`FrameExtractor::run`] on Tokio's blocking
//! pool so worker threads and their joins never stall the async runtime.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{ExtractError, ExtractionConfig, FrameExtractor};
//!
//! # async fn example() -> Result<(), ExtractError> {
//! let extractor = FrameExtractor::new(ExtractionConfig::new("input.mp4"))?;
//! let summary = extractor.run_async().await?;
//! println!("wrote {} frames", summary.frames_written);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

use crate::error::ExtractError;
use crate::extractor::{ExtractionSummary, FrameExtractor};
use crate::source::SourceFactory;

/// A future resolving to the summary of a finished job.
pub struct ExtractionFuture {
    handle: JoinHandle<Result<ExtractionSummary, ExtractError>>,
}

impl Future for ExtractionFuture {
    type Output = Result<ExtractionSummary, ExtractError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|error| Err(join_error(error))))
    }
}

fn join_error(error: JoinError) -> ExtractError {
    if error.is_panic() {
        ExtractError::TaskPanicked
    } else {
        ExtractError::Cancelled
    }
}

impl<F: SourceFactory> FrameExtractor<F> {
    /// Run the job on a blocking thread and resolve when it finishes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run_async(self) -> ExtractionFuture {
        ExtractionFuture {
            handle: tokio::task::spawn_blocking(move || self.run()),
        }
    }
}
