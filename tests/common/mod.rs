//! Synthetic video sources shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use framesplit::{ExtractError, SourceFactory, VideoSource};
use image::{DynamicImage, Rgb, RgbImage};

/// Produces tiny solid frames whose shade encodes the frame number.
#[derive(Clone)]
pub struct PatternFactory {
    /// Frame count the source reports.
    pub reported_frames: u64,
    /// Frames actually present before end of stream.
    pub stream_frames: u64,
    pub seekable: bool,
    /// Frame numbers whose decode fails.
    pub corrupt: Arc<HashSet<u64>>,
    /// Decode calls across every opened source.
    pub decoded: Arc<AtomicU64>,
    /// Sources opened so far.
    pub opened: Arc<AtomicU64>,
}

impl PatternFactory {
    pub fn new(frames: u64) -> Self {
        Self {
            reported_frames: frames,
            stream_frames: frames,
            seekable: true,
            corrupt: Arc::new(HashSet::new()),
            decoded: Arc::new(AtomicU64::new(0)),
            opened: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn sequential(mut self) -> Self {
        self.seekable = false;
        self
    }

    pub fn truncated_at(mut self, stream_frames: u64) -> Self {
        self.stream_frames = stream_frames;
        self
    }

    pub fn with_corrupt(mut self, frames: &[u64]) -> Self {
        self.corrupt = Arc::new(frames.iter().copied().collect());
        self
    }

    pub fn decoded(&self) -> u64 {
        self.decoded.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }
}

pub struct PatternSource {
    cursor: u64,
    factory: PatternFactory,
}

impl VideoSource for PatternSource {
    fn frame_count(&self) -> u64 {
        self.factory.reported_frames
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError> {
        if self.cursor >= self.factory.stream_frames {
            return Ok(None);
        }
        let frame_number = self.cursor;
        self.cursor += 1;
        self.factory.decoded.fetch_add(1, Ordering::SeqCst);

        if self.factory.corrupt.contains(&frame_number) {
            return Err(ExtractError::VideoDecodeError(format!(
                "corrupt frame {frame_number}"
            )));
        }

        let shade = (frame_number % 256) as u8;
        Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            2,
            2,
            Rgb([shade, 0, 255 - shade]),
        ))))
    }

    fn can_seek(&self) -> bool {
        self.factory.seekable
    }

    fn seek_to_frame(&mut self, frame_number: u64) -> Result<(), ExtractError> {
        self.cursor = frame_number;
        Ok(())
    }
}

impl SourceFactory for PatternFactory {
    type Source = PatternSource;

    fn open(&self) -> Result<PatternSource, ExtractError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(PatternSource {
            cursor: 0,
            factory: self.clone(),
        })
    }

    fn describe(&self) -> String {
        format!("pattern ({} frames)", self.reported_frames)
    }
}

/// Sorted names of the files in `directory`.
pub fn file_names(directory: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .expect("Failed to read output directory")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
