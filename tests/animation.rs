//! Sequence assembler tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use scenereel::{
    AnimationOptions, OutputDirectory, SceneReelError, assemble_animation, frame_duration_ms,
};

fn write_frames(dir: &Path, count: usize) -> Vec<PathBuf> {
    let storage = OutputDirectory::create(dir).unwrap();
    (0..count)
        .map(|index| {
            let shade = (index * 40 % 256) as u8;
            let image = RgbImage::from_pixel(48, 32, Rgb([shade, 255 - shade, 90]));
            storage.save_scene(index, "png", &image).unwrap()
        })
        .collect()
}

fn decode_gif(path: &Path) -> (Vec<u16>, gif::Repeat, (u16, u16)) {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();
    let size = (decoder.width(), decoder.height());
    let mut delays = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        delays.push(frame.delay);
    }
    (delays, decoder.repeat(), size)
}

// ── Frame duration ─────────────────────────────────────────────────

#[test]
fn short_sequences_use_default_duration() {
    assert_eq!(frame_duration_ms(1, 100, 10_000), 100);
    assert_eq!(frame_duration_ms(3, 100, 10_000), 100);
    assert_eq!(frame_duration_ms(100, 100, 10_000), 100);
}

#[test]
fn long_sequences_are_capped() {
    assert_eq!(frame_duration_ms(101, 100, 10_000), 99);
    assert_eq!(frame_duration_ms(200, 100, 10_000), 50);
    assert_eq!(frame_duration_ms(150, 100, 10_000), 66);
    for n in [101_usize, 150, 333, 1000] {
        assert!(n as u64 * frame_duration_ms(n, 100, 10_000) <= 10_000);
    }
}

// ── Assembly ───────────────────────────────────────────────────────

#[test]
fn three_frames_loop_forever_at_default_rate() {
    let dir = tempfile::tempdir().unwrap();
    let frames = write_frames(dir.path(), 3);

    let animation = assemble_animation(&frames, dir.path(), &AnimationOptions::new()).unwrap();
    assert_eq!(animation.path, dir.path().join("scenes_animation.gif"));
    assert_eq!(animation.frame_count, 3);
    assert_eq!(animation.frame_duration_ms, 100);
    assert_eq!(animation.total_duration_ms(), 300);

    let (delays, repeat, size) = decode_gif(&animation.path);
    assert_eq!(delays, vec![10, 10, 10]);
    assert_eq!(repeat, gif::Repeat::Infinite);
    assert_eq!(size, (48, 32));
}

#[test]
fn many_frames_shrink_per_frame_delay() {
    let dir = tempfile::tempdir().unwrap();
    let frames = write_frames(dir.path(), 120);

    let animation = assemble_animation(&frames, dir.path(), &AnimationOptions::new()).unwrap();
    assert_eq!(animation.frame_duration_ms, 80);
    assert!(animation.total_duration_ms() <= 10_000);

    let (delays, _, _) = decode_gif(&animation.path);
    assert_eq!(delays.len(), 120);
    assert!(delays.iter().all(|&delay| delay == 8));
}

#[test]
fn encoded_total_stays_under_ceiling() {
    for (count, expected_delay) in [(101_usize, 9_u16), (150, 6)] {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), count);

        let animation = assemble_animation(&frames, dir.path(), &AnimationOptions::new()).unwrap();
        let (delays, _, _) = decode_gif(&animation.path);
        let encoded_ms: u64 = delays.iter().map(|&delay| u64::from(delay) * 10).sum();

        assert_eq!(delays.len(), count);
        assert!(delays.iter().all(|&delay| delay == expected_delay));
        assert!(encoded_ms <= 10_000, "{count} frames encode to {encoded_ms} ms");
        assert_eq!(animation.frame_duration_ms, u64::from(expected_delay) * 10);
        assert_eq!(animation.total_duration_ms(), encoded_ms);
    }
}

#[test]
fn width_option_resizes_frames() {
    let dir = tempfile::tempdir().unwrap();
    let frames = write_frames(dir.path(), 2);
    let options = AnimationOptions::new()
        .with_width(24)
        .with_file_name("preview.gif")
        .with_repeat(Some(2));

    let animation = assemble_animation(&frames, dir.path(), &options).unwrap();
    assert_eq!(animation.path, dir.path().join("preview.gif"));
    let (_, repeat, size) = decode_gif(&animation.path);
    assert_eq!(size, (24, 16));
    assert_eq!(repeat, gif::Repeat::Finite(2));
}

#[test]
fn empty_frame_list_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let result = assemble_animation(&[], dir.path(), &AnimationOptions::new());

    assert!(matches!(result, Err(SceneReelError::EmptyFrameSet)));
    assert!(!dir.path().join("scenes_animation.gif").exists());
}

#[test]
fn missing_frame_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = write_frames(dir.path(), 2);
    frames.insert(1, dir.path().join("scene_9.png"));

    match assemble_animation(&frames, dir.path(), &AnimationOptions::new()) {
        Err(SceneReelError::FrameLoad { path, .. }) => {
            assert_eq!(path, dir.path().join("scene_9.png"));
        }
        other => panic!("Expected FrameLoad, got: {other:?}"),
    }
    assert!(!dir.path().join("scenes_animation.gif").exists());
}

#[test]
fn corrupt_frame_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let frames = write_frames(dir.path(), 3);
    std::fs::write(&frames[1], b"not an image at all").unwrap();

    match assemble_animation(&frames, dir.path(), &AnimationOptions::new()) {
        Err(SceneReelError::FrameLoad { path, .. }) => assert_eq!(path, frames[1]),
        other => panic!("Expected FrameLoad, got: {other:?}"),
    }
    assert!(!dir.path().join("scenes_animation.gif").exists());
}

#[test]
fn scene_paths_follow_naming_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let storage = OutputDirectory::create(dir.path().join("nested/run")).unwrap();
    assert!(storage.path().is_dir());
    assert_eq!(
        storage.scene_path(7, "jpg"),
        dir.path().join("nested/run/scene_7.jpg")
    );
}
