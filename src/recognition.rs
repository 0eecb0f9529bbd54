//! Text recognition on keyframes.
//!
//! The recognition engine itself is a black box behind [`TextRecognizer`].
//! It is expensive to initialise, so one handle is created per run and
//! injected into [`SceneTextReader`], which filters its detections to a
//! target [`Charset`] and joins them into scene-level text.
//!
//! [`TesseractRecognizer`] drives the `tesseract` command-line engine;
//! [`NullRecognizer`] disables recognition.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scenereel::{Charset, RecognitionOptions, SceneTextReader, TesseractRecognizer};
//!
//! let engine = TesseractRecognizer::new(RecognitionOptions::new())?;
//! let reader = SceneTextReader::new(Arc::new(engine), Charset::Ascii);
//! let image = image::open("scene_0.jpg")?;
//! println!("{}", reader.read(&image)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    env,
    ffi::OsString,
    io::{Cursor, Write},
    process::{Command, Stdio},
    sync::Arc,
};

use image::{DynamicImage, ImageFormat};

use crate::error::SceneReelError;

/// Axis-aligned region of a detection, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl BoundingBox {
    fn union(self, other: BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self
            .left
            .saturating_add(self.width)
            .max(other.left.saturating_add(other.width));
        let bottom = self
            .top
            .saturating_add(self.height)
            .max(other.top.saturating_add(other.height));
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// One text span reported by a recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Where the text was found.
    pub bounds: BoundingBox,
    /// The recognized text.
    pub text: String,
    /// Engine confidence, 0.0–1.0.
    pub confidence: f32,
}

impl Detection {
    /// Convenience constructor.
    pub fn new(text: impl Into<String>, bounds: BoundingBox, confidence: f32) -> Self {
        Self {
            bounds,
            text: text.into(),
            confidence,
        }
    }
}

/// A text recognition capability.
///
/// Implementations are long-lived handles shared across scenes (and across
/// rayon workers when parallel annotation is enabled), hence `Send + Sync`.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in `image`, returning detections in emission order.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Detection>, SceneReelError>;
}

/// A recognizer that never finds any text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Detection>, SceneReelError> {
        Ok(Vec::new())
    }
}

/// The set of characters a detection must stay within to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Printable ASCII plus space and tab (the English configuration).
    #[default]
    Ascii,
    /// Keep every detection.
    Any,
}

impl Charset {
    /// Whether every character of `text` belongs to this charset.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            Charset::Ascii => text
                .chars()
                .all(|c| c.is_ascii_graphic() || c == ' ' || c == '\t'),
            Charset::Any => true,
        }
    }
}

/// Turns recognizer output into scene-level text.
#[derive(Clone)]
pub struct SceneTextReader {
    recognizer: Arc<dyn TextRecognizer>,
    charset: Charset,
}

impl SceneTextReader {
    /// Wrap a recognizer handle.
    pub fn new(recognizer: Arc<dyn TextRecognizer>, charset: Charset) -> Self {
        Self {
            recognizer,
            charset,
        }
    }

    /// Recognize, filter, and join the text in one frame.
    ///
    /// Detections outside the charset are dropped; confidence and geometry
    /// are ignored. The rest are joined with single spaces in the order the
    /// engine emitted them. No qualifying detection gives an empty string.
    ///
    /// # Errors
    ///
    /// Only engine failures are reported; an empty result is not an error.
    pub fn read(&self, image: &DynamicImage) -> Result<String, SceneReelError> {
        let detections = self.recognizer.recognize(image)?;
        Ok(self.join(&detections))
    }

    /// Filter and join detections that were already produced.
    pub fn join(&self, detections: &[Detection]) -> String {
        detections
            .iter()
            .filter(|detection| !detection.text.is_empty() && self.charset.accepts(&detection.text))
            .map(|detection| detection.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Settings for [`TesseractRecognizer`].
#[derive(Debug, Clone)]
pub struct RecognitionOptions {
    /// Executable to run. Defaults to `$TESSERACT_CMD`, then `tesseract`.
    pub command: OsString,
    /// Tesseract language code. Default: `"eng"`.
    pub language: String,
    /// Tesseract page segmentation mode. Default: 11 (sparse text), which
    /// suits captions scattered over a video frame.
    pub page_segmentation_mode: u8,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            command: env::var_os("TESSERACT_CMD").unwrap_or_else(|| OsString::from("tesseract")),
            language: "eng".to_string(),
            page_segmentation_mode: 11,
        }
    }
}

impl RecognitionOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the executable.
    pub fn with_command(mut self, command: impl Into<OsString>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_page_segmentation_mode(mut self, mode: u8) -> Self {
        self.page_segmentation_mode = mode;
        self
    }
}

/// Recognizer backed by the `tesseract` command-line engine.
///
/// The engine is probed once in [`new`](TesseractRecognizer::new); each
/// [`recognize`](TextRecognizer::recognize) call pipes a PNG to the engine's
/// stdin and parses its TSV report.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    options: RecognitionOptions,
    version: String,
}

impl TesseractRecognizer {
    /// Probe the engine and create a handle.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::ToolNotFound`] when the executable cannot be
    /// run.
    pub fn new(options: RecognitionOptions) -> Result<Self, SceneReelError> {
        let tool = options.command.to_string_lossy().into_owned();
        let output = Command::new(&options.command)
            .arg("--version")
            .output()
            .map_err(|error| SceneReelError::ToolNotFound {
                tool: tool.clone(),
                reason: error.to_string(),
            })?;
        if !output.status.success() {
            return Err(SceneReelError::ToolNotFound {
                tool,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        let version = String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        log::info!("Using text recognizer: {version} (lang={})", options.language);

        Ok(Self { options, version })
    }

    /// First line of the engine's version banner.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parse a Tesseract TSV report into line-level detections.
    ///
    /// Word rows (level 5) are grouped by block, paragraph, and line; each
    /// group becomes one detection whose text is its words joined by spaces,
    /// whose bounds enclose them, and whose confidence is their mean.
    pub fn detections_from_tsv(tsv: &str) -> Vec<Detection> {
        let mut detections: Vec<Detection> = Vec::new();
        let mut current_line: Option<(u32, u32, u32)> = None;
        let mut confidence_sum = 0.0_f32;
        let mut word_count = 0_u32;

        let flush = |detections: &mut Vec<Detection>, sum: &mut f32, count: &mut u32| {
            if let Some(last) = detections.last_mut()
                && *count > 0
            {
                last.confidence = (*sum / *count as f32 / 100.0).clamp(0.0, 1.0);
            }
            *sum = 0.0;
            *count = 0;
        };

        for row in tsv.lines().skip(1) {
            let columns: Vec<&str> = row.split('\t').collect();
            if columns.len() < 12 || columns[0] != "5" {
                continue;
            }
            let text = columns[11].trim();
            let confidence = columns[10].parse::<f32>().unwrap_or(-1.0);
            if text.is_empty() || confidence < 0.0 {
                continue;
            }

            let number = |index: usize| columns[index].parse::<u32>().unwrap_or(0);
            let line_key = (number(2), number(3), number(4));
            let bounds = BoundingBox {
                left: number(6),
                top: number(7),
                width: number(8),
                height: number(9),
            };

            if current_line == Some(line_key)
                && let Some(last) = detections.last_mut()
            {
                last.text.push(' ');
                last.text.push_str(text);
                last.bounds = last.bounds.union(bounds);
            } else {
                flush(&mut detections, &mut confidence_sum, &mut word_count);
                detections.push(Detection::new(text, bounds, 0.0));
                current_line = Some(line_key);
            }
            confidence_sum += confidence;
            word_count += 1;
        }
        flush(&mut detections, &mut confidence_sum, &mut word_count);

        detections
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Detection>, SceneReelError> {
        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;

        let mut child = Command::new(&self.options.command)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.options.language)
            .arg("--psm")
            .arg(self.options.page_segmentation_mode.to_string())
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| SceneReelError::RecognitionError(error.to_string()))?;

        // The child is always reaped, even when it closed stdin early.
        let written = child
            .stdin
            .take()
            .map(|mut stdin| stdin.write_all(png.get_ref()))
            .transpose();

        let output = child
            .wait_with_output()
            .map_err(|error| SceneReelError::RecognitionError(error.to_string()))?;
        if !output.status.success() {
            return Err(SceneReelError::RecognitionError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        written.map_err(|error| SceneReelError::RecognitionError(error.to_string()))?;

        let detections = Self::detections_from_tsv(&String::from_utf8_lossy(&output.stdout));
        log::debug!("Recognizer returned {} detections", detections.len());
        Ok(detections)
    }
}
