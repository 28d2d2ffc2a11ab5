//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when an
//! [`FfmpegSourceFactory`](crate::FfmpegSourceFactory) is created and shared
//! by every worker source it opens afterwards.

use std::time::Duration;

/// Metadata for the best video stream of a file.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames. Taken from the stream header when present,
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
