//! # scenereel
//!
//! Turn a video into a scene reel: split it into scenes, pull one keyframe
//! per scene, read the text on each keyframe, stamp a watermark, and
//! assemble the frames into a looping GIF preview.
//!
//! Decoding is done by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; text
//! recognition sits behind the [`TextRecognizer`] trait.
//!
//! ## Quick Start
//!
//! ### Run the whole pipeline
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scenereel::{PipelineOptions, RecognitionOptions, ScenePipeline, TesseractRecognizer};
//!
//! let engine = TesseractRecognizer::new(RecognitionOptions::new())?;
//! let pipeline = ScenePipeline::new(PipelineOptions::new("out"), Arc::new(engine))?;
//! let output = pipeline.run_file("input.mp4")?;
//! println!("{}", output.text);
//! # Ok::<(), scenereel::SceneReelError>(())
//! ```
//!
//! ### Detect scenes only
//!
//! ```no_run
//! use scenereel::{SceneDetectionOptions, VideoSource, detect_scenes};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! let scenes = detect_scenes(&mut source, &SceneDetectionOptions::new())?;
//! println!("{} scenes", scenes.len());
//! # Ok::<(), scenereel::SceneReelError>(())
//! ```
//!
//! ## Features
//!
//! - **Scene segmentation**: HSV content-change detection with a threshold
//!   and minimum scene length
//! - **Keyframes**: the midpoint frame of each scene, decoded at source
//!   resolution
//! - **Text recognition**: injected engine handle, charset filtering
//! - **Watermarking**: outlined, anti-aliased, centered label; built-in
//!   bitmap face or any TrueType font
//! - **Animation**: looping GIF whose total length is capped
//! - **Search and download**: `yt-dlp` collaborator for the CLI's `run`
//!   command
//! - **Progress**: callbacks for every long stage
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Annotate scenes on a thread pool, one decoder per worker |
//! | `full`  | Enables all optional features |

mod conversion;
pub mod download;
pub mod duration;
pub mod error;
pub mod ffmpeg;
pub mod font;
pub mod gif;
pub mod keyframe;
pub mod metadata;
#[cfg(feature = "rayon")]
mod parallel;
pub mod pipeline;
pub mod progress;
pub mod recognition;
pub mod scene;
pub mod search;
pub mod source;
pub mod storage;
pub mod watermark;
pub mod ytdlp;

pub use download::VideoDownloader;
pub use duration::parse_duration;
pub use error::SceneReelError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use font::{FontSource, LabelMask};
pub use gif::{Animation, AnimationOptions, assemble_animation, frame_duration_ms};
pub use keyframe::{Keyframe, extract_keyframe, keyframe_indices};
pub use metadata::VideoMetadata;
pub use pipeline::{
    AnnotatedFrame, PipelineOptions, PipelineOutput, ScenePipeline, join_scene_text,
};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use recognition::{
    BoundingBox, Charset, Detection, NullRecognizer, RecognitionOptions, SceneTextReader,
    TesseractRecognizer, TextRecognizer,
};
pub use scene::{
    ContentDetector, Scene, SceneDetectionOptions, detect_scenes, detect_scenes_with_progress,
    frame_content_score,
};
pub use search::{Candidate, SearchOptions, VideoSearch, find_candidate, select_candidate};
pub use source::{FrameSource, VideoSource};
pub use storage::OutputDirectory;
pub use watermark::{LabelPlacement, WatermarkOptions, Watermarker};
pub use ytdlp::YtDlp;
