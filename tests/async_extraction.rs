//! Async extraction tests (feature = "async").

#![cfg(feature = "async")]

mod common;

use std::sync::Arc;

use common::{PatternFactory, file_names};
use framesplit::{ExtractError, ExtractionConfig, FrameExtractor, ProgressRenderer};

#[tokio::test]
async fn run_async_resolves_with_summary() {
    let directory = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::new("async.mp4")
        .with_save_dir(directory.path())
        .with_show_progress(false)
        .with_workers(2)
        .with_frame_interval(2);

    let summary = FrameExtractor::with_factory(config, PatternFactory::new(8))
        .unwrap()
        .run_async()
        .await
        .unwrap();

    assert_eq!(summary.frames_visited, 8);
    assert_eq!(
        file_names(&summary.output_dir),
        vec!["frame_0.png", "frame_2.png", "frame_4.png", "frame_6.png"]
    );
}

struct PanickingRenderer;

impl ProgressRenderer for PanickingRenderer {
    fn render(&self, _current: u64, _total: u64) {}

    fn finish(&self) {
        panic!("renderer failed to close its line");
    }
}

#[tokio::test]
async fn panic_in_background_task_is_not_reported_as_cancellation() {
    let directory = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::new("panic.mp4")
        .with_save_dir(directory.path())
        .with_renderer(Arc::new(PanickingRenderer))
        .with_workers(2);

    let result = FrameExtractor::with_factory(config, PatternFactory::new(4))
        .unwrap()
        .run_async()
        .await;

    assert!(matches!(result, Err(ExtractError::TaskPanicked)), "{result:?}");
}
