//! Label rasterization.
//!
//! Both font sources render a single line of text into a [`LabelMask`]: a
//! per-pixel coverage map (0.0–1.0) with a known baseline. The built-in
//! face is a 5×7 dot matrix scaled to the requested height with 4×4
//! supersampling, so scaled edges come out anti-aliased. TrueType faces are
//! rasterized with `fontdue`.

use std::path::{Path, PathBuf};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};

use crate::error::SceneReelError;

/// Where label glyphs come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FontSource {
    /// The embedded 5×7 dot-matrix face. Always available.
    #[default]
    Builtin,
    /// A TrueType or OpenType file.
    File(PathBuf),
}

/// Coverage map of one rendered line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMask {
    /// Width of the inked extent, in pixels.
    pub width: u32,
    /// Height of the mask, in pixels.
    pub height: u32,
    /// Distance from the top row to the baseline.
    pub ascent: u32,
    /// Row-major coverage, `width * height` entries.
    pub coverage: Vec<f32>,
}

impl LabelMask {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            ascent: 0,
            coverage: Vec::new(),
        }
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn at(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }
}

/// A loaded face, ready to render labels.
pub(crate) enum LabelFont {
    Builtin,
    TrueType(Box<Font>),
}

impl LabelFont {
    pub(crate) fn load(source: &FontSource) -> Result<Self, SceneReelError> {
        match source {
            FontSource::Builtin => Ok(LabelFont::Builtin),
            FontSource::File(path) => load_truetype(path),
        }
    }

    /// Render `text` so that its cap height is about `glyph_height` pixels.
    pub(crate) fn render(&self, text: &str, glyph_height: u32) -> LabelMask {
        match self {
            LabelFont::Builtin => render_builtin(text, glyph_height),
            LabelFont::TrueType(font) => render_truetype(font, text, glyph_height),
        }
    }
}

fn load_truetype(path: &Path) -> Result<LabelFont, SceneReelError> {
    let bytes = std::fs::read(path).map_err(|error| {
        SceneReelError::FontError(format!("failed to read {}: {error}", path.display()))
    })?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|error| {
        SceneReelError::FontError(format!("failed to parse {}: {error}", path.display()))
    })?;
    log::debug!("Loaded label font {}", path.display());
    Ok(LabelFont::TrueType(Box::new(font)))
}

const GLYPH_COLUMNS: usize = 5;
const GLYPH_ROWS: usize = 7;
const SUPERSAMPLE: u32 = 4;

/// Column bitmaps for 0x20..=0x7E, bit 0 at the top row.
const GLYPHS: [[u8; GLYPH_COLUMNS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x01, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x32], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

fn glyph_for(c: char) -> &'static [u8; GLYPH_COLUMNS] {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        &GLYPHS[(code - 0x20) as usize]
    } else {
        &GLYPHS[(b'?' - 0x20) as usize]
    }
}

/// Dot columns for a whole line, one blank column between glyphs.
fn dot_columns(text: &str) -> Vec<u8> {
    let mut columns = Vec::new();
    for (index, c) in text.chars().enumerate() {
        if index > 0 {
            columns.push(0);
        }
        columns.extend_from_slice(glyph_for(c));
    }
    columns
}

fn render_builtin(text: &str, glyph_height: u32) -> LabelMask {
    let columns = dot_columns(text);
    if columns.is_empty() || glyph_height == 0 {
        return LabelMask::empty();
    }

    let dot_size = glyph_height as f32 / GLYPH_ROWS as f32;
    let width = (columns.len() as f32 * dot_size).ceil() as u32;
    let height = glyph_height;
    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;

    let mut coverage = vec![0.0_f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut hits = 0_u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                    let py = y as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                    let column = (px / dot_size) as usize;
                    let row = (py / dot_size) as usize;
                    if column < columns.len()
                        && row < GLYPH_ROWS
                        && columns[column] & (1 << row) != 0
                    {
                        hits += 1;
                    }
                }
            }
            coverage[(y * width + x) as usize] = hits as f32 / samples;
        }
    }

    LabelMask {
        width,
        height,
        ascent: height,
        coverage,
    }
}

fn render_truetype(font: &Font, text: &str, glyph_height: u32) -> LabelMask {
    // Cap height is roughly 70% of the em size for common faces.
    let px = glyph_height as f32 / 0.7;

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(text, px, 0));

    let glyphs: Vec<_> = layout
        .glyphs()
        .iter()
        .filter(|glyph| glyph.width > 0 && glyph.height > 0)
        .cloned()
        .collect();
    if glyphs.is_empty() {
        return LabelMask::empty();
    }

    let baseline = layout
        .lines()
        .and_then(|lines| lines.first().map(|line| line.baseline_y))
        .unwrap_or(px);

    let left = glyphs.iter().map(|g| g.x.floor() as i32).min().unwrap_or(0);
    let right = glyphs
        .iter()
        .map(|g| g.x.floor() as i32 + g.width as i32)
        .max()
        .unwrap_or(0);
    let top = glyphs.iter().map(|g| g.y.floor() as i32).min().unwrap_or(0);
    let bottom = glyphs
        .iter()
        .map(|g| g.y.floor() as i32 + g.height as i32)
        .max()
        .unwrap_or(0);

    let width = (right - left).max(0) as u32;
    let height = (bottom - top).max(0) as u32;
    let mut coverage = vec![0.0_f32; (width * height) as usize];

    for glyph in &glyphs {
        let (_, bitmap) = font.rasterize_config(glyph.key);
        let origin_x = glyph.x.floor() as i32 - left;
        let origin_y = glyph.y.floor() as i32 - top;
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let x = origin_x + gx as i32;
                let y = origin_y + gy as i32;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    continue;
                }
                let value = bitmap[gy * glyph.width + gx] as f32 / 255.0;
                let cell = &mut coverage[y as usize * width as usize + x as usize];
                *cell = cell.max(value);
            }
        }
    }

    LabelMask {
        width,
        height,
        ascent: (baseline.round() as i32 - top).clamp(0, height as i32) as u32,
        coverage,
    }
}
