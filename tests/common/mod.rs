//! Shared helpers for integration tests: synthetic in-memory video sources
//! and scripted recognizers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};
use scenereel::{BoundingBox, Detection, FrameSource, SceneReelError, TextRecognizer};

/// A decoded video held in memory.
pub struct MemorySource {
    frames: Vec<RgbImage>,
    broken: HashSet<u64>,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames,
            broken: HashSet::new(),
        }
    }

    /// Solid-color segments: `(frame_count, color)` pairs, in order.
    pub fn from_segments(width: u32, height: u32, segments: &[(usize, [u8; 3])]) -> Self {
        let frames = segments
            .iter()
            .flat_map(|&(count, color)| {
                std::iter::repeat_with(move || RgbImage::from_pixel(width, height, Rgb(color)))
                    .take(count)
            })
            .collect();
        Self::new(frames)
    }

    /// Make random-access decoding of `frame_number` fail.
    pub fn break_frame(mut self, frame_number: u64) -> Self {
        self.broken.insert(frame_number);
        self
    }
}

impl FrameSource for MemorySource {
    fn scan_frames(
        &mut self,
        analysis_width: Option<u32>,
        visitor: &mut dyn FnMut(u64, &RgbImage) -> Result<(), SceneReelError>,
    ) -> Result<u64, SceneReelError> {
        for (index, frame) in self.frames.iter().enumerate() {
            match analysis_width {
                Some(width) if width < frame.width() => {
                    let height = (frame.height() as u64 * width as u64 / frame.width() as u64)
                        .max(1) as u32;
                    let scaled = image::imageops::resize(frame, width, height, FilterType::Triangle);
                    visitor(index as u64, &scaled)?;
                }
                _ => visitor(index as u64, frame)?,
            }
        }
        Ok(self.frames.len() as u64)
    }

    fn frame(&mut self, frame_number: u64) -> Result<RgbImage, SceneReelError> {
        if self.broken.contains(&frame_number) {
            return Err(SceneReelError::VideoDecodeError(format!(
                "corrupt frame {frame_number}"
            )));
        }
        self.frames
            .get(frame_number as usize)
            .cloned()
            .ok_or(SceneReelError::FrameOutOfRange {
                frame_number,
                total_frames: self.frames.len() as u64,
            })
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }
}

/// Returns a fixed list of texts for every image, in order.
pub struct ScriptedRecognizer {
    texts: Vec<String>,
}

impl ScriptedRecognizer {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|text| text.to_string()).collect(),
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Detection>, SceneReelError> {
        Ok(self
            .texts
            .iter()
            .map(|text| Detection::new(text.clone(), BoundingBox::default(), 0.9))
            .collect())
    }
}

/// Returns one queued answer per call; `None` entries fail.
pub struct SequenceRecognizer {
    answers: Mutex<Vec<Option<String>>>,
}

impl SequenceRecognizer {
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        let mut answers: Vec<Option<String>> = answers
            .into_iter()
            .map(|answer| answer.map(str::to_string))
            .collect();
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
        }
    }
}

impl TextRecognizer for SequenceRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<Detection>, SceneReelError> {
        let next = self.answers.lock().unwrap().pop().flatten();
        match next {
            Some(text) => Ok(vec![Detection::new(text, BoundingBox::default(), 0.9)]),
            None => Err(SceneReelError::RecognitionError("engine crashed".to_string())),
        }
    }
}

pub const RED: [u8; 3] = [230, 20, 20];
pub const GREEN: [u8; 3] = [10, 120, 10];
pub const BLUE: [u8; 3] = [20, 20, 230];

/// Three visually distinct segments of 30, 20 and 50 frames.
pub fn three_scene_source() -> MemorySource {
    MemorySource::from_segments(
        64,
        48,
        &[(30, RED), (20, GREEN), (50, BLUE)],
    )
}
