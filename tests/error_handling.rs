//! FFmpeg-backed error and fixture tests.
//!
//! Fixture tests require files from `tests/fixtures/generate_fixtures.sh`
//! and are skipped when they are missing.

mod common;

use std::path::Path;

use common::file_names;
use framesplit::{
    ExtractError, ExtractionConfig, FfmpegSourceFactory, FrameExtractor, ImageFormat,
    SourceFactory, VideoSource, frame_file_name,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.mp4"
}

#[test]
fn open_nonexistent_file() {
    let result = FfmpegSourceFactory::new("this_file_does_not_exist.mp4");

    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open video file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = FfmpegSourceFactory::new(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid video file");
}

#[test]
fn extractor_rejects_missing_file_before_creating_output() {
    let temporary_directory = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::new("missing/clip.mp4")
        .with_save_dir(temporary_directory.path())
        .with_show_progress(false);

    let result = FrameExtractor::new(config);
    assert!(matches!(result, Err(ExtractError::FileOpen { .. })));
    assert!(!temporary_directory.path().join("clip").exists());
}

#[test]
fn audio_only_file_has_no_video_stream() {
    let path = sample_audio_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let error = FfmpegSourceFactory::new(path).unwrap_err();
    assert!(
        error.to_string().contains("No video stream"),
        "Error should mention no video stream: {error}",
    );
}

#[test]
fn fixture_metadata_is_probed() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let factory = FfmpegSourceFactory::new(path).expect("Failed to open fixture");
    let metadata = factory.metadata();
    assert_eq!((metadata.width, metadata.height), (320, 240));
    assert!(metadata.frames_per_second > 0.0);
    assert!(metadata.frame_count > 0);
}

#[test]
fn fixture_source_decodes_then_ends() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let factory = FfmpegSourceFactory::new(path).expect("Failed to open fixture");
    let mut source = factory.open().expect("Failed to open source");
    let mut decoded = 0_u64;
    while let Some(frame) = source.next_frame().expect("Decode failed") {
        assert_eq!(frame.width(), 320);
        decoded += 1;
    }
    assert!(decoded > 0);
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn fixture_parallel_extraction_writes_every_sampled_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::new(path)
        .with_save_dir(temporary_directory.path())
        .with_workers(3)
        .with_frame_interval(5)
        .with_show_progress(false);

    let extractor = FrameExtractor::new(config).expect("Failed to prepare extraction");
    let total = extractor.total_frames();
    let summary = extractor.run().expect("Extraction failed");

    assert_eq!(summary.output_dir, temporary_directory.path().join("sample_video"));
    assert_eq!(summary.decode_failures, 0);
    assert!(summary.frames_visited > 0 && summary.frames_visited <= total);

    let names = file_names(&summary.output_dir);
    assert!(!names.is_empty());
    assert!(names.len() as u64 <= total.div_ceil(5));
    assert!(names.contains(&frame_file_name(0, total, ImageFormat::Png)));
}

fn extract_fixture(save_dir: &Path, seek: bool) -> framesplit::ExtractionSummary {
    let config = ExtractionConfig::new(sample_video_path())
        .with_save_dir(save_dir)
        .with_workers(4)
        .with_frame_interval(5)
        .with_seek(seek)
        .with_show_progress(false);

    FrameExtractor::new(config)
        .expect("Failed to prepare extraction")
        .run()
        .expect("Extraction failed")
}

#[test]
fn fixture_seek_and_sequential_write_identical_frames() {
    if !Path::new(sample_video_path()).exists() {
        return;
    }

    let seek_directory = tempfile::tempdir().unwrap();
    let sequential_directory = tempfile::tempdir().unwrap();
    let seeked = extract_fixture(seek_directory.path(), true);
    let sequential = extract_fixture(sequential_directory.path(), false);

    let total = seeked.total_frames;
    assert_eq!(total, 50);
    assert_eq!(seeked.frames_visited, total);
    assert_eq!(sequential.frames_visited, total);
    assert!(seeked.workers.iter().skip(1).all(|report| report.seeked));

    let expected: Vec<String> = (0..total)
        .step_by(5)
        .map(|index| frame_file_name(index, total, ImageFormat::Png))
        .collect();
    assert_eq!(file_names(&seeked.output_dir), expected);
    assert_eq!(file_names(&sequential.output_dir), expected);

    for name in &expected {
        let from_seek = image::open(seeked.output_dir.join(name)).unwrap().to_rgb8();
        let from_start = image::open(sequential.output_dir.join(name)).unwrap().to_rgb8();
        assert!(
            from_seek.as_raw() == from_start.as_raw(),
            "{name} differs between seek and sequential extraction",
        );
    }
}

#[test]
fn fixture_damaged_packets_do_not_surface_as_frame_errors() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().unwrap();
    let damaged_path = temporary_directory.path().join("damaged.mp4");
    let mut bytes = std::fs::read(path).unwrap();
    let length = bytes.len();
    for byte in &mut bytes[length * 2 / 5..length / 2] {
        *byte = 0xFF;
    }
    std::fs::write(&damaged_path, bytes).unwrap();

    let Ok(factory) = FfmpegSourceFactory::new(&damaged_path) else {
        return;
    };
    let mut source = factory.open().expect("Failed to open source");
    let mut decoded = 0_u64;
    while let Some(frame) = source
        .next_frame()
        .expect("Packet damage must not be reported as a frame failure")
    {
        assert_eq!(frame.width(), 320);
        decoded += 1;
    }
    assert!(decoded <= factory.metadata().frame_count + 1);
}
