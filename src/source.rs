//! Decoder abstraction used by extraction workers.
//!
//! A [`VideoSource`] is a sequential decoder with its own cursor starting at
//! frame 0. Sources that can reposition their cursor report it through
//! [`can_seek`](VideoSource::can_seek); workers then jump straight to the
//! start of their range instead of decoding and discarding the prefix.
//!
//! Each worker opens a private source through a shared [`SourceFactory`],
//! so no decoder state is ever shared between threads.

use image::DynamicImage;

use crate::error::ExtractError;

/// A sequential frame decoder.
pub trait VideoSource {
    /// Total number of frames the source reports.
    fn frame_count(&self) -> u64;

    /// Decode the frame under the cursor and advance.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. An `Err` reports a
    /// frame that could not be decoded; the cursor still moves past it.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError>;

    /// Whether [`seek_to_frame`](VideoSource::seek_to_frame) is supported.
    fn can_seek(&self) -> bool {
        false
    }

    /// Reposition so that the next call to
    /// [`next_frame`](VideoSource::next_frame) yields frame `frame_number`.
    fn seek_to_frame(&mut self, frame_number: u64) -> Result<(), ExtractError> {
        let _ = frame_number;
        Err(ExtractError::SeekUnsupported)
    }
}

/// Opens independent [`VideoSource`] instances against one video.
///
/// Shared by reference across worker threads.
pub trait SourceFactory: Send + Sync + 'static {
    /// The source type this factory produces.
    type Source: VideoSource;

    /// Open a fresh source with its cursor at frame 0.
    fn open(&self) -> Result<Self::Source, ExtractError>;

    /// Total frame count of the video.
    ///
    /// The default opens a throwaway source and asks it.
    fn frame_count(&self) -> Result<u64, ExtractError> {
        Ok(self.open()?.frame_count())
    }

    /// Human-readable identity of the video, used in log messages.
    fn describe(&self) -> String;
}
