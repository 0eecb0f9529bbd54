//! Animated preview assembly.
//!
//! Annotated keyframes are loaded back from storage in scene order and
//! encoded as a looping GIF. The whole animation is encoded in memory and
//! written only after every frame has been loaded, so a failed run never
//! leaves a partial file behind.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use scenereel::{AnimationOptions, assemble_animation};
//!
//! let frames = vec![PathBuf::from("out/scene_0.jpg"), PathBuf::from("out/scene_1.jpg")];
//! let animation = assemble_animation(&frames, "out", &AnimationOptions::new())?;
//! println!("{} frames at {} ms", animation.frame_count, animation.frame_duration_ms);
//! # Ok::<(), scenereel::SceneReelError>(())
//! ```

use std::path::{Path, PathBuf};

use gif::{Encoder, Frame, Repeat};
use image::{RgbImage, imageops::FilterType};

use crate::{conversion::scaled_dimensions, error::SceneReelError};

/// Configuration for the animated preview.
#[derive(Debug, Clone)]
pub struct AnimationOptions {
    /// Output file name inside the output directory.
    /// Default: `"scenes_animation.gif"`.
    pub file_name: String,
    /// Per-frame display time while the total stays under the ceiling.
    /// Default: 100 ms.
    pub default_frame_ms: u64,
    /// Upper bound on total animation length. Default: 10 000 ms.
    pub max_total_ms: u64,
    /// Target width in pixels, aspect preserved. `None` keeps the first
    /// frame's size.
    pub width: Option<u32>,
    /// How many times the GIF repeats. `None` loops forever.
    pub repeat: Option<u16>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            file_name: "scenes_animation.gif".to_string(),
            default_frame_ms: 100,
            max_total_ms: 10_000,
            width: None,
            repeat: None,
        }
    }
}

impl AnimationOptions {
    /// Create a new [`AnimationOptions`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Set the default per-frame duration in milliseconds.
    pub fn with_default_frame_ms(mut self, ms: u64) -> Self {
        self.default_frame_ms = ms;
        self
    }

    /// Set the total duration ceiling in milliseconds.
    pub fn with_max_total_ms(mut self, ms: u64) -> Self {
        self.max_total_ms = ms;
        self
    }

    /// Set the target width (height is auto-scaled to preserve aspect ratio).
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the repeat count. `None` means loop forever.
    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }
}

/// A written animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Where the GIF was written.
    pub path: PathBuf,
    /// Number of frames.
    pub frame_count: usize,
    /// Display time of each frame in milliseconds.
    pub frame_duration_ms: u64,
    /// Repeat count; `None` loops forever.
    pub repeat: Option<u16>,
}

impl Animation {
    /// Total play time of one loop in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.frame_duration_ms * self.frame_count as u64
    }
}

/// Per-frame display time for `frame_count` frames.
///
/// `default_ms` when `frame_count * default_ms` stays within `ceiling_ms`,
/// otherwise `ceiling_ms / frame_count` (integer division).
///
/// ```
/// use scenereel::frame_duration_ms;
///
/// assert_eq!(frame_duration_ms(3, 100, 10_000), 100);
/// assert_eq!(frame_duration_ms(100, 100, 10_000), 100);
/// assert_eq!(frame_duration_ms(150, 100, 10_000), 66);
/// ```
pub fn frame_duration_ms(frame_count: usize, default_ms: u64, ceiling_ms: u64) -> u64 {
    let count = frame_count as u64;
    if count == 0 || count.saturating_mul(default_ms) <= ceiling_ms {
        default_ms
    } else {
        ceiling_ms / count
    }
}

/// Load `frame_paths` in order and write a GIF to
/// `output_dir/options.file_name`.
///
/// # Errors
///
/// - [`SceneReelError::EmptyFrameSet`] if `frame_paths` is empty.
/// - [`SceneReelError::FrameLoad`] if any frame cannot be read.
/// - [`SceneReelError::GifEncodeError`] if encoding fails.
///
/// No file is written in any of these cases.
pub fn assemble_animation<P: AsRef<Path>>(
    frame_paths: &[PathBuf],
    output_dir: P,
    options: &AnimationOptions,
) -> Result<Animation, SceneReelError> {
    if frame_paths.is_empty() {
        return Err(SceneReelError::EmptyFrameSet);
    }

    let frames = frame_paths
        .iter()
        .map(|path| {
            image::open(path)
                .map(|image| image.to_rgb8())
                .map_err(|error| SceneReelError::FrameLoad {
                    path: path.clone(),
                    reason: error.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let delay = delay_centiseconds(frame_duration_ms(
        frames.len(),
        options.default_frame_ms,
        options.max_total_ms,
    ));
    let bytes = encode_gif_to_memory(&frames, delay, options)?;
    let frame_duration_ms = u64::from(delay) * 10;

    let path = output_dir.as_ref().join(&options.file_name);
    std::fs::write(&path, bytes)?;
    log::info!(
        "Wrote {} frames to {} ({} ms per frame)",
        frames.len(),
        path.display(),
        frame_duration_ms,
    );

    Ok(Animation {
        path,
        frame_count: frames.len(),
        frame_duration_ms,
        repeat: options.repeat,
    })
}

/// GIF delays are in hundredths of a second. Truncates so the encoded
/// total never exceeds the requested one; never zero, which most viewers
/// treat as "as fast as possible".
fn delay_centiseconds(frame_ms: u64) -> u16 {
    (frame_ms / 10).clamp(1, u16::MAX as u64) as u16
}

/// Encode frames as an animated GIF into memory.
///
/// Every frame is resized to the target size (the first frame's, or the
/// configured width) and quantized with the `gif` crate's built-in
/// quantiser.
pub(crate) fn encode_gif_to_memory(
    frames: &[RgbImage],
    delay: u16,
    options: &AnimationOptions,
) -> Result<Vec<u8>, SceneReelError> {
    let Some(first) = frames.first() else {
        return Err(SceneReelError::EmptyFrameSet);
    };
    let (width, height) = scaled_dimensions(first.width(), first.height(), options.width);
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(SceneReelError::GifEncodeError(format!(
            "Frame size {width}x{height} exceeds the GIF limit"
        )));
    }
    log::debug!(
        "Encoding {} frames to GIF in memory ({width}x{height}, {delay} cs)",
        frames.len(),
    );

    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, width as u16, height as u16, &[])
            .map_err(|e| SceneReelError::GifEncodeError(format!("Failed to create GIF encoder: {e}")))?;

        let repeat = match options.repeat {
            None => Repeat::Infinite,
            Some(n) => Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| SceneReelError::GifEncodeError(format!("Failed to set GIF repeat: {e}")))?;

        for image in frames {
            let resized;
            let pixels = if image.width() == width && image.height() == height {
                image
            } else {
                resized = image::imageops::resize(image, width, height, FilterType::Triangle);
                &resized
            };

            let mut gif_frame = Frame::from_rgb_speed(width as u16, height as u16, pixels.as_raw(), 10);
            gif_frame.delay = delay;

            encoder.write_frame(&gif_frame).map_err(|e| {
                SceneReelError::GifEncodeError(format!("Failed to write GIF frame: {e}"))
            })?;
        }
    }

    Ok(buffer)
}
