//! Label watermarking.
//!
//! The label is rendered once when the [`Watermarker`] is built, then
//! stamped onto every keyframe. Each stamp is two passes at the same
//! baseline: an outline (the glyph coverage dilated by `outline_width`) in
//! the outline color, then the glyphs themselves in the fill color. Both
//! passes blend by fractional coverage, so edges are anti-aliased.
//!
//! # Example
//!
//! ```no_run
//! use scenereel::{WatermarkOptions, Watermarker};
//!
//! let watermarker = Watermarker::new(WatermarkOptions::new().with_label("demo"))?;
//! let mut frame = image::open("scene_0.jpg")?.to_rgb8();
//! watermarker.apply(&mut frame);
//! frame.save("scene_0.jpg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use image::{Rgb, RgbImage};

use crate::{
    error::SceneReelError,
    font::{FontSource, LabelFont, LabelMask},
};

/// Watermark appearance and placement.
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Text to stamp. Default: `"scenereel"`.
    pub label: String,
    /// Approximate glyph height in pixels. Default: 24.
    pub glyph_height: u32,
    /// Outline thickness in pixels around each glyph. Default: 2.
    pub outline_width: u32,
    /// Distance from the bottom edge to the baseline. Default: 10.
    pub bottom_inset: u32,
    /// Glyph color. Default: white.
    pub fill: Rgb<u8>,
    /// Outline color. Default: black.
    pub outline: Rgb<u8>,
    /// Glyph source. Default: the built-in face.
    pub font: FontSource,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            label: "scenereel".to_string(),
            glyph_height: 24,
            outline_width: 2,
            bottom_inset: 10,
            fill: Rgb([255, 255, 255]),
            outline: Rgb([0, 0, 0]),
            font: FontSource::Builtin,
        }
    }
}

impl WatermarkOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label text.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the glyph height in pixels.
    pub fn with_glyph_height(mut self, pixels: u32) -> Self {
        self.glyph_height = pixels;
        self
    }

    /// Set the outline thickness in pixels.
    pub fn with_outline_width(mut self, pixels: u32) -> Self {
        self.outline_width = pixels;
        self
    }

    /// Set the baseline distance from the bottom edge.
    pub fn with_bottom_inset(mut self, pixels: u32) -> Self {
        self.bottom_inset = pixels;
        self
    }

    /// Set fill and outline colors.
    pub fn with_colors(mut self, fill: Rgb<u8>, outline: Rgb<u8>) -> Self {
        self.fill = fill;
        self.outline = outline;
        self
    }

    /// Set the glyph source.
    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = font;
        self
    }
}

/// Where the label lands on a frame of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    /// Horizontal anchor (frame center).
    pub anchor_x: i64,
    /// Baseline row.
    pub baseline_y: i64,
    /// Left edge of the glyph ink.
    pub left: i64,
    /// Top edge of the glyph ink.
    pub top: i64,
    /// Glyph ink width.
    pub width: u32,
    /// Glyph ink height.
    pub height: u32,
}

/// Stamps a pre-rendered label onto frames.
#[derive(Debug, Clone)]
pub struct Watermarker {
    options: WatermarkOptions,
    fill_mask: LabelMask,
    outline_mask: LabelMask,
}

impl Watermarker {
    /// Load the font and render the label.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::FontError`] if a font file cannot be read or
    /// parsed.
    pub fn new(options: WatermarkOptions) -> Result<Self, SceneReelError> {
        let font = LabelFont::load(&options.font)?;
        let glyphs = font.render(&options.label, options.glyph_height);
        let fill_mask = pad(&glyphs, options.outline_width);
        let outline_mask = dilate(&fill_mask, options.outline_width);
        log::debug!(
            "Rendered watermark {:?} at {}x{} px",
            options.label,
            glyphs.width,
            glyphs.height,
        );

        Ok(Self {
            options,
            fill_mask,
            outline_mask,
        })
    }

    /// The options this watermarker was built with.
    pub fn options(&self) -> &WatermarkOptions {
        &self.options
    }

    /// Compute where the label lands on a `frame_width` × `frame_height`
    /// frame. The ink is centered on `frame_width / 2`, with its baseline
    /// `bottom_inset` pixels above the bottom edge.
    pub fn placement(&self, frame_width: u32, frame_height: u32) -> LabelPlacement {
        let pad = self.options.outline_width as i64;
        let width = self.fill_mask.width.saturating_sub(2 * self.options.outline_width);
        let height = self.fill_mask.height.saturating_sub(2 * self.options.outline_width);
        let anchor_x = frame_width as i64 / 2;
        let baseline_y = frame_height as i64 - self.options.bottom_inset as i64;
        let ascent = self.fill_mask.ascent as i64 - pad;

        LabelPlacement {
            anchor_x,
            baseline_y,
            left: anchor_x - width as i64 / 2,
            top: baseline_y - ascent,
            width,
            height,
        }
    }

    /// Draw the label onto `frame` in place: outline first, then fill.
    /// Parts of the label falling outside the frame are clipped.
    pub fn apply(&self, frame: &mut RgbImage) {
        if self.fill_mask.width == 0 {
            return;
        }
        let placement = self.placement(frame.width(), frame.height());
        let pad = self.options.outline_width as i64;
        let origin_x = placement.left - pad;
        let origin_y = placement.top - pad;

        blend_mask(frame, &self.outline_mask, origin_x, origin_y, self.options.outline);
        blend_mask(frame, &self.fill_mask, origin_x, origin_y, self.options.fill);
    }
}

fn blend_mask(frame: &mut RgbImage, mask: &LabelMask, origin_x: i64, origin_y: i64, color: Rgb<u8>) {
    let (frame_width, frame_height) = (frame.width() as i64, frame.height() as i64);
    for my in 0..mask.height as i64 {
        let y = origin_y + my;
        if y < 0 || y >= frame_height {
            continue;
        }
        for mx in 0..mask.width as i64 {
            let x = origin_x + mx;
            if x < 0 || x >= frame_width {
                continue;
            }
            let alpha = mask.at(mx, my);
            if alpha <= 0.0 {
                continue;
            }
            let pixel = frame.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let base = pixel.0[channel] as f32;
                let target = color.0[channel] as f32;
                pixel.0[channel] = (base + (target - base) * alpha).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Surround a mask with `border` empty pixels on every side.
fn pad(mask: &LabelMask, border: u32) -> LabelMask {
    let width = mask.width + 2 * border;
    let height = mask.height + 2 * border;
    let mut coverage = vec![0.0_f32; (width * height) as usize];
    for y in 0..mask.height {
        for x in 0..mask.width {
            coverage[((y + border) * width + x + border) as usize] =
                mask.coverage[(y * mask.width + x) as usize];
        }
    }
    LabelMask {
        width,
        height,
        ascent: mask.ascent + border,
        coverage,
    }
}

/// Grow coverage outward by a disk of `radius` pixels.
fn dilate(mask: &LabelMask, radius: u32) -> LabelMask {
    let r = radius as i64;
    let offsets: Vec<(i64, i64)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let mut coverage = vec![0.0_f32; mask.coverage.len()];
    for y in 0..mask.height as i64 {
        for x in 0..mask.width as i64 {
            coverage[(y * mask.width as i64 + x) as usize] = offsets
                .iter()
                .map(|(dx, dy)| mask.at(x + dx, y + dy))
                .fold(0.0, f32::max);
        }
    }
    LabelMask {
        coverage,
        ..mask.clone()
    }
}
