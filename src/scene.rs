//! Scene segmentation by content-change detection.
//!
//! Every decoded frame is converted to HSV and compared with its
//! predecessor. The content score of a frame is the average of the mean
//! absolute hue, saturation, and value differences, on a 0–255 scale. A
//! frame starts a new scene when its score reaches the threshold and the
//! scene it would close is at least `min_scene_len` frames long.
//!
//! # Example
//!
//! ```no_run
//! use scenereel::{SceneDetectionOptions, VideoSource, detect_scenes};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! let options = SceneDetectionOptions::new().threshold(27.0).min_scene_len(20);
//! for scene in detect_scenes(&mut source, &options)? {
//!     println!("frames {}..{} (keyframe {})", scene.start_frame, scene.end_frame, scene.midpoint());
//! }
//! # Ok::<(), scenereel::SceneReelError>(())
//! ```

use std::sync::Arc;

use image::RgbImage;

use crate::{
    error::SceneReelError,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    source::FrameSource,
};

/// A contiguous run of frames, `[start_frame, end_frame)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scene {
    /// First frame of the scene (inclusive).
    pub start_frame: u64,
    /// One past the last frame of the scene (exclusive).
    pub end_frame: u64,
}

impl Scene {
    /// Number of frames in the scene.
    pub fn len(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    /// Always `false`: a scene holds at least one frame.
    pub fn is_empty(&self) -> bool {
        self.end_frame <= self.start_frame
    }

    /// Representative frame index, `start + (end - start) / 2`.
    pub fn midpoint(&self) -> u64 {
        self.start_frame + (self.end_frame - self.start_frame) / 2
    }
}

/// Scene detection settings.
#[derive(Debug, Clone)]
pub struct SceneDetectionOptions {
    /// Minimum content score (0.0–255.0) for a frame to start a new scene.
    /// Default: 30.0.
    pub threshold: f64,
    /// Minimum number of frames a scene must hold before another boundary
    /// is accepted. Default: 15.
    pub min_scene_len: u64,
    /// Width frames are downscaled to before scoring. `None` scores at
    /// source resolution. Default: 256.
    pub analysis_width: Option<u32>,
}

impl Default for SceneDetectionOptions {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            min_scene_len: 15,
            analysis_width: Some(256),
        }
    }
}

impl SceneDetectionOptions {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content score threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the minimum scene length in frames. Clamped to at least 1.
    pub fn min_scene_len(mut self, frames: u64) -> Self {
        self.min_scene_len = frames.max(1);
        self
    }

    /// Set the analysis width. `None` disables downscaling.
    pub fn analysis_width(mut self, width: Option<u32>) -> Self {
        self.analysis_width = width;
        self
    }
}

/// Per-pixel HSV planes of one analysed frame.
struct HsvFrame {
    width: u32,
    height: u32,
    hue: Vec<u8>,
    saturation: Vec<u8>,
    value: Vec<u8>,
}

impl HsvFrame {
    fn from_rgb(image: &RgbImage) -> Self {
        let pixel_count = (image.width() as usize) * (image.height() as usize);
        let mut hue = Vec::with_capacity(pixel_count);
        let mut saturation = Vec::with_capacity(pixel_count);
        let mut value = Vec::with_capacity(pixel_count);

        for pixel in image.pixels() {
            let [h, s, v] = rgb_to_hsv(pixel.0);
            hue.push(h);
            saturation.push(s);
            value.push(v);
        }

        Self {
            width: image.width(),
            height: image.height(),
            hue,
            saturation,
            value,
        }
    }
}

/// 8-bit HSV with hue on 0–179, saturation and value on 0–255.
fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let saturation = if max == 0 {
        0.0
    } else {
        delta * 255.0 / max as f32
    };

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g as f32 - b as f32) / delta
    } else if max == g {
        120.0 + 60.0 * (b as f32 - r as f32) / delta
    } else {
        240.0 + 60.0 * (r as f32 - g as f32) / delta
    };
    let hue_degrees = if hue_degrees < 0.0 {
        hue_degrees + 360.0
    } else {
        hue_degrees
    };

    [
        ((hue_degrees / 2.0).round() as u32 % 180) as u8,
        saturation.round() as u8,
        max,
    ]
}

fn mean_absolute_difference(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    sum as f64 / a.len() as f64
}

/// Content score between two frames on a 0–255 scale.
///
/// Frames of different dimensions score the maximum.
fn content_score(previous: &HsvFrame, current: &HsvFrame) -> f64 {
    if previous.width != current.width || previous.height != current.height {
        return 255.0;
    }
    let delta_hue = mean_absolute_difference(&previous.hue, &current.hue);
    let delta_saturation = mean_absolute_difference(&previous.saturation, &current.saturation);
    let delta_value = mean_absolute_difference(&previous.value, &current.value);
    (delta_hue + delta_saturation + delta_value) / 3.0
}

/// Compute the content score between two RGB frames.
///
/// Exposed for diagnostics and threshold tuning; the detector uses the same
/// computation internally.
pub fn frame_content_score(previous: &RgbImage, current: &RgbImage) -> f64 {
    content_score(&HsvFrame::from_rgb(previous), &HsvFrame::from_rgb(current))
}

/// Streaming content-change detector.
///
/// Feed frames in order with [`process_frame`](ContentDetector::process_frame),
/// then call [`finish`](ContentDetector::finish) with the total frame count
/// to obtain the scene list.
pub struct ContentDetector {
    threshold: f64,
    min_scene_len: u64,
    previous: Option<HsvFrame>,
    last_boundary: u64,
    boundaries: Vec<u64>,
}

impl ContentDetector {
    /// Create a detector from scene detection settings.
    pub fn new(options: &SceneDetectionOptions) -> Self {
        Self {
            threshold: options.threshold,
            min_scene_len: options.min_scene_len.max(1),
            previous: None,
            last_boundary: 0,
            boundaries: Vec::new(),
        }
    }

    /// Analyse the next frame.
    ///
    /// Returns the frame's content score (`None` for the first frame, which
    /// has nothing to compare against).
    pub fn process_frame(&mut self, frame_number: u64, image: &RgbImage) -> Option<f64> {
        let current = HsvFrame::from_rgb(image);
        let score = self
            .previous
            .as_ref()
            .map(|previous| content_score(previous, &current));

        if let Some(score) = score
            && score >= self.threshold
            && frame_number.saturating_sub(self.last_boundary) >= self.min_scene_len
        {
            log::debug!("Scene boundary at frame {frame_number} (score={score:.2})");
            self.boundaries.push(frame_number);
            self.last_boundary = frame_number;
        }

        self.previous = Some(current);
        score
    }

    /// Frame indices where accepted boundaries were declared so far.
    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    /// Build the scene list covering `[0, total_frames)`.
    ///
    /// A trailing scene shorter than `min_scene_len` is merged into the scene
    /// before it. A video with no frames yields no scenes.
    pub fn finish(self, total_frames: u64) -> Vec<Scene> {
        if total_frames == 0 {
            return Vec::new();
        }

        let mut starts: Vec<u64> = std::iter::once(0)
            .chain(
                self.boundaries
                    .iter()
                    .copied()
                    .filter(|&b| b > 0 && b < total_frames),
            )
            .collect();

        let trailing_len = total_frames - starts[starts.len() - 1];
        if starts.len() > 1 && trailing_len < self.min_scene_len {
            starts.pop();
        }

        starts
            .iter()
            .enumerate()
            .map(|(index, &start_frame)| Scene {
                start_frame,
                end_frame: starts.get(index + 1).copied().unwrap_or(total_frames),
            })
            .collect()
    }
}

/// Segment a video source into scenes.
///
/// Decodes the whole source once. The result is ordered, contiguous, and
/// covers every decoded frame.
///
/// # Errors
///
/// Propagates decoding errors from the source; segmentation itself cannot
/// fail.
pub fn detect_scenes<S: FrameSource + ?Sized>(
    source: &mut S,
    options: &SceneDetectionOptions,
) -> Result<Vec<Scene>, SceneReelError> {
    detect_scenes_with_progress(source, options, Arc::new(NoOpProgress))
}

/// Like [`detect_scenes`], reporting one progress tick per decoded frame.
pub fn detect_scenes_with_progress<S: FrameSource + ?Sized>(
    source: &mut S,
    options: &SceneDetectionOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Vec<Scene>, SceneReelError> {
    log::debug!(
        "Detecting scenes (threshold={}, min_scene_len={}, analysis_width={:?})",
        options.threshold,
        options.min_scene_len,
        options.analysis_width,
    );

    let mut detector = ContentDetector::new(options);
    let mut tracker = ProgressTracker::new(
        progress,
        OperationType::SceneDetection,
        source.frame_count_hint(),
        25,
    );

    let total_frames = source.scan_frames(options.analysis_width, &mut |frame_number, image| {
        detector.process_frame(frame_number, image);
        tracker.advance(Some(frame_number));
        Ok(())
    })?;
    tracker.finish();

    let scenes = detector.finish(total_frames);
    log::info!("Detected {} scenes across {} frames", scenes.len(), total_frames);
    Ok(scenes)
}
