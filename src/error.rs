//! Error types for the `scenereel` crate.
//!
//! This module defines [`SceneReelError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (file
//! paths, frame numbers, upstream messages) for the caller to decide whether
//! to skip a scene or abort the run.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `scenereel` operations.
///
/// Scene-level failures (a keyframe that cannot be decoded, a recognizer
/// call that fails) are reported with the same type as run-level failures;
/// the [`ScenePipeline`](crate::ScenePipeline) decides which ones to skip.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SceneReelError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The requested frame number exceeds the number of frames in the video.
    #[error("Frame {frame_number} is out of range (video has {total_frames} frames)")]
    FrameOutOfRange {
        /// The frame number that was requested.
        frame_number: u64,
        /// The total number of frames in the video.
        total_frames: u64,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while converting or saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// GIF encoding failed.
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// Assembly was attempted with no annotated frames.
    #[error("Cannot assemble an animation from an empty frame set")]
    EmptyFrameSet,

    /// An intermediate frame image could not be loaded during assembly.
    #[error("Failed to load frame image {path}: {reason}")]
    FrameLoad {
        /// Path of the frame image.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// The text recognition engine failed on a frame.
    #[error("Text recognition failed: {0}")]
    RecognitionError(String),

    /// An external tool (recognizer, downloader) is not installed or not runnable.
    #[error("Required tool `{tool}` is unavailable: {reason}")]
    ToolNotFound {
        /// Command name that was probed.
        tool: String,
        /// Why the probe failed.
        reason: String,
    },

    /// The watermark font could not be loaded.
    #[error("Font error: {0}")]
    FontError(String),

    /// The video search collaborator failed.
    #[error("Video search failed: {0}")]
    SearchError(String),

    /// No search result satisfied the duration ceiling.
    #[error("No suitable video found for {query:?} under {max_duration_seconds} seconds")]
    NoCandidate {
        /// The free-text query.
        query: String,
        /// The duration ceiling that was applied.
        max_duration_seconds: u64,
    },

    /// The download collaborator failed or found no compatible stream.
    #[error("Download failed: {0}")]
    DownloadError(String),
}

impl From<FfmpegError> for SceneReelError {
    fn from(error: FfmpegError) -> Self {
        SceneReelError::FfmpegError(error.to_string())
    }
}
