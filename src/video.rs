//! FFmpeg-backed [`VideoSource`].
//!
//! [`FfmpegSourceFactory`] probes the file once for its [`VideoMetadata`],
//! then opens one [`FfmpegSource`] per worker. Each source owns its own
//! demuxer, decoder and RGB scaler; all of them are released when the
//! source is dropped, however the worker loop ends.
//!
//! Seeking jumps to the nearest keyframe at or before the requested frame
//! and then decodes forward, discarding frames until the target is reached.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    error::ExtractError,
    metadata::VideoMetadata,
    source::{SourceFactory, VideoSource},
    utilities,
};

/// Opens [`FfmpegSource`] instances for one video file.
///
/// # Example
///
/// ```no_run
/// use framesplit::FfmpegSourceFactory;
///
/// let factory = FfmpegSourceFactory::new("input.mp4")?;
/// println!("{} frames", factory.metadata().frame_count);
/// # Ok::<(), framesplit::ExtractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegSourceFactory {
    path: PathBuf,
    metadata: VideoMetadata,
}

impl FfmpegSourceFactory {
    /// Probe `path` and cache its video metadata.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::FileOpen`] if FFmpeg cannot open the file.
    /// - [`ExtractError::NoVideoStream`] if it has no video stream.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();
        let input = open_input(&path)?;
        let metadata = probe_metadata(&input, &path)?;

        log::debug!(
            "Probed {}: {}x{} @ {:.3} fps, {} frames [{}]",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self { path, metadata })
    }

    /// Metadata of the video stream every source decodes.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path of the video file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceFactory for FfmpegSourceFactory {
    type Source = FfmpegSource;

    fn open(&self) -> Result<FfmpegSource, ExtractError> {
        FfmpegSource::open(&self.path, &self.metadata)
    }

    fn frame_count(&self) -> Result<u64, ExtractError> {
        match self.metadata.frame_count {
            0 => Err(ExtractError::UnknownFrameCount(self.path.clone())),
            count => Ok(count),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A private demuxer/decoder pair reading one video stream sequentially.
pub struct FfmpegSource {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    /// First timestamp of the stream, in `time_base` units.
    start_time: i64,
    frames_per_second: f64,
    frame_count: u64,
    width: u32,
    height: u32,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    /// Frames before this number are dropped after a seek.
    seek_target: Option<u64>,
    eof_sent: bool,
    read_errors: ReadErrors,
}

/// Demuxer failures tolerated in a row before the input is treated as ended.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 16;

/// Counts consecutive packet read failures.
#[derive(Debug, Default)]
struct ReadErrors {
    consecutive: u32,
}

impl ReadErrors {
    fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failure; `true` once the input should be abandoned.
    fn exhausted_after_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= MAX_CONSECUTIVE_READ_ERRORS
    }
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("stream_index", &self.stream_index)
            .field("frames_per_second", &self.frames_per_second)
            .field("frame_count", &self.frame_count)
            .field("seek_target", &self.seek_target)
            .field("eof_sent", &self.eof_sent)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    fn open(path: &Path, metadata: &VideoMetadata) -> Result<Self, ExtractError> {
        let input = open_input(path)?;

        let stream = input
            .stream(metadata.stream_index)
            .ok_or(ExtractError::NoVideoStream)?;
        let time_base = stream.time_base();
        // AV_NOPTS_VALUE means the container does not know its start.
        let start_time = match stream.start_time() {
            i64::MIN => 0,
            value => value,
        };
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index: metadata.stream_index,
            time_base,
            start_time,
            frames_per_second: metadata.frames_per_second,
            frame_count: metadata.frame_count,
            width: metadata.width,
            height: metadata.height,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            seek_target: None,
            eof_sent: false,
            read_errors: ReadErrors::default(),
        })
    }

    fn convert_current_frame(&mut self) -> Result<DynamicImage, ExtractError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = utilities::packed_rgb(&self.rgb_frame, self.width, self.height);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            ExtractError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }

    fn end_input(&mut self) {
        if let Err(error) = self.decoder.send_eof() {
            log::warn!("Failed to flush decoder at end of input: {error}");
        }
        self.eof_sent = true;
    }

    /// Frame number of the last decoded frame, or `None` without a timestamp.
    fn current_frame_number(&self) -> Option<u64> {
        let pts = self
            .decoded_frame
            .timestamp()
            .or_else(|| self.decoded_frame.pts())?;
        Some(utilities::pts_to_frame_number(
            pts,
            self.start_time,
            self.time_base,
            self.frames_per_second,
        ))
    }
}

impl VideoSource for FfmpegSource {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError> {
        loop {
            // Drain anything the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                if let Some(target) = self.seek_target {
                    // Untimed frames cannot be placed, so they end the skip.
                    if self
                        .current_frame_number()
                        .is_some_and(|frame_number| frame_number < target)
                    {
                        continue;
                    }
                    self.seek_target = None;
                }
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            // Packet failures stay here; only conversion errors reach the caller.
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    self.read_errors.reset();
                    if packet.stream() == self.stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            log::warn!("Dropping undecodable packet: {error}");
                        }
                    }
                }
                Err(FfmpegError::Eof) => self.end_input(),
                Err(error) => {
                    log::warn!("Packet read failed: {error}");
                    if self.read_errors.exhausted_after_failure() {
                        log::warn!(
                            "Giving up after {MAX_CONSECUTIVE_READ_ERRORS} consecutive read errors"
                        );
                        self.end_input();
                    }
                }
            }
        }
    }

    fn can_seek(&self) -> bool {
        self.frames_per_second > 0.0
    }

    fn seek_to_frame(&mut self, frame_number: u64) -> Result<(), ExtractError> {
        if !self.can_seek() {
            return Err(ExtractError::SeekUnsupported);
        }

        let timestamp =
            utilities::frame_number_to_seek_timestamp(frame_number, self.frames_per_second)
                + utilities::ticks_to_microseconds(self.start_time, self.time_base);
        self.input.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.read_errors.reset();
        self.seek_target = Some(frame_number);

        log::debug!("Seeked to frame {frame_number} (ts {timestamp})");
        Ok(())
    }
}

fn open_input(path: &Path) -> Result<Input, ExtractError> {
    // Safe to call repeatedly.
    ffmpeg_next::init().map_err(|error| ExtractError::FileOpen {
        path: path.to_path_buf(),
        reason: format!("FFmpeg initialisation failed: {error}"),
    })?;

    ffmpeg_next::format::input(&path).map_err(|error| ExtractError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

fn probe_metadata(input: &Input, path: &Path) -> Result<VideoMetadata, ExtractError> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or(ExtractError::NoVideoStream)?;

    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        ExtractError::FileOpen {
            path: path.to_path_buf(),
            reason: format!("Failed to read video codec parameters: {error}"),
        }
    })?;
    let decoder = decoder_context
        .decoder()
        .video()
        .map_err(|error| ExtractError::FileOpen {
            path: path.to_path_buf(),
            reason: format!("Failed to create video decoder: {error}"),
        })?;

    let duration_microseconds = input.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let frames_per_second = utilities::rate_to_fps(stream.avg_frame_rate())
        .or_else(|| utilities::rate_to_fps(stream.rate()))
        .unwrap_or(0.0);

    // Prefer the header's count; fall back to duration × rate.
    let frame_count = if stream.frames() > 0 {
        stream.frames() as u64
    } else {
        (duration.as_secs_f64() * frames_per_second) as u64
    };

    let codec = decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(VideoMetadata {
        width: decoder.width(),
        height: decoder.height(),
        frames_per_second,
        frame_count,
        duration,
        codec,
        format: input.format().name().to_string(),
        stream_index: stream.index(),
    })
}
