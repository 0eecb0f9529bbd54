//! FFmpeg-backed source integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;
use std::sync::Arc;

use scenereel::{
    FrameSource, NullRecognizer, PipelineOptions, SceneDetectionOptions, SceneReelError,
    ScenePipeline, VideoSource, detect_scenes,
};

fn three_scenes_path() -> &'static str {
    "tests/fixtures/three_scenes.mp4"
}

#[test]
fn open_reports_metadata() {
    let path = three_scenes_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata();
    assert_eq!((metadata.width, metadata.height), (320, 240));
    assert!((metadata.frames_per_second - 25.0).abs() < 0.01);
    assert!((98..=102).contains(&metadata.frame_count));
}

#[test]
fn open_missing_file_fails() {
    match VideoSource::open("tests/fixtures/does_not_exist.mp4") {
        Err(SceneReelError::FileOpen { path, .. }) => {
            assert!(path.ends_with("does_not_exist.mp4"));
        }
        other => panic!("Expected FileOpen, got: {other:?}"),
    }
}

#[test]
fn fixture_segments_into_three_scenes() {
    let path = three_scenes_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let scenes = detect_scenes(&mut source, &SceneDetectionOptions::default())
        .expect("Failed to detect scenes");

    assert_eq!(scenes.len(), 3, "scenes: {scenes:?}");
    assert_eq!(scenes[0].start_frame, 0);
    assert!(scenes[1].start_frame.abs_diff(30) <= 1);
    assert!(scenes[2].start_frame.abs_diff(50) <= 1);
    assert_eq!(Some(scenes[2].end_frame), source.decoded_frame_count());
}

#[test]
fn random_access_decodes_expected_color() {
    let path = three_scenes_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let expected_channel = [(15_u64, 0_usize), (40, 1), (75, 2)];
    for (frame_number, channel) in expected_channel {
        let image = source.frame(frame_number).expect("Failed to decode frame");
        assert_eq!(image.dimensions(), (320, 240));
        let pixel = image.get_pixel(160, 120).0;
        let dominant = (0..3).max_by_key(|&c| pixel[c]).unwrap();
        assert_eq!(dominant, channel, "frame {frame_number} pixel {pixel:?}");
    }
}

#[test]
fn frame_past_end_is_out_of_range() {
    let path = three_scenes_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    assert!(matches!(
        source.frame(10_000),
        Err(SceneReelError::FrameOutOfRange { .. })
    ));
}

#[test]
fn pipeline_runs_on_fixture() {
    let path = three_scenes_path();
    if !Path::new(path).exists() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let pipeline = ScenePipeline::new(PipelineOptions::new(dir.path()), Arc::new(NullRecognizer))
        .expect("Failed to build pipeline");
    let output = pipeline.run_file(path).expect("Pipeline failed");

    assert_eq!(output.frames.len(), 3);
    assert_eq!(output.text, "");
    assert!(output.animation.path.exists());
    for index in 0..3 {
        assert!(dir.path().join(format!("scene_{index}.jpg")).exists());
    }
}
