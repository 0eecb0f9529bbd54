//! The segmentation and annotation pipeline.
//!
//! [`ScenePipeline`] runs the stages in order:
//!
//! 1. segment the source into scenes,
//! 2. for each scene, decode the midpoint keyframe, recognize its text,
//!    stamp the watermark and save it as `scene_<i>.<ext>`,
//! 3. join the per-scene text,
//! 4. assemble the saved frames into a looping GIF.
//!
//! A scene whose keyframe cannot be decoded is skipped with a warning; a
//! recognizer failure leaves that scene's text empty. Assembly failures are
//! fatal.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scenereel::{NullRecognizer, PipelineOptions, ScenePipeline};
//!
//! let pipeline = ScenePipeline::new(PipelineOptions::new("out"), Arc::new(NullRecognizer))?;
//! let output = pipeline.run_file("input.mp4")?;
//! println!("{} scenes -> {}", output.scenes.len(), output.animation.path.display());
//! # Ok::<(), scenereel::SceneReelError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use image::DynamicImage;

use crate::{
    error::SceneReelError,
    gif::{Animation, AnimationOptions, assemble_animation},
    keyframe::extract_keyframe,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    recognition::{Charset, SceneTextReader, TextRecognizer},
    scene::{Scene, SceneDetectionOptions, detect_scenes_with_progress},
    source::{FrameSource, VideoSource},
    storage::OutputDirectory,
    watermark::{WatermarkOptions, Watermarker},
};

/// Configuration for a pipeline run.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Directory frames and the animation are written to. Created if absent.
    pub output_dir: PathBuf,
    /// Image format extension for saved frames. Default: `"jpg"`.
    pub image_extension: String,
    /// Scene detection settings.
    pub scene: SceneDetectionOptions,
    /// Watermark settings.
    pub watermark: WatermarkOptions,
    /// Animation settings.
    pub animation: AnimationOptions,
    /// Characters recognized text must stay within. Default: ASCII.
    pub charset: Charset,
    /// Progress callback. Default: none.
    pub progress: Option<Arc<dyn ProgressCallback>>,
    /// Annotate scenes on rayon workers when the `rayon` feature is
    /// enabled. Ignored otherwise. Default: `false`.
    pub parallel: bool,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("output_dir", &self.output_dir)
            .field("image_extension", &self.image_extension)
            .field("scene", &self.scene)
            .field("watermark", &self.watermark)
            .field("animation", &self.animation)
            .field("charset", &self.charset)
            .field("progress", &self.progress.is_some())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl PipelineOptions {
    /// Create options writing into `output_dir`, all else default.
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            image_extension: "jpg".to_string(),
            scene: SceneDetectionOptions::default(),
            watermark: WatermarkOptions::default(),
            animation: AnimationOptions::default(),
            charset: Charset::default(),
            progress: None,
            parallel: false,
        }
    }

    /// Set the frame image format extension.
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// Set scene detection settings.
    pub fn with_scene_detection(mut self, options: SceneDetectionOptions) -> Self {
        self.scene = options;
        self
    }

    /// Set watermark settings.
    pub fn with_watermark(mut self, options: WatermarkOptions) -> Self {
        self.watermark = options;
        self
    }

    /// Set animation settings.
    pub fn with_animation(mut self, options: AnimationOptions) -> Self {
        self.animation = options;
        self
    }

    /// Set the recognized-text charset.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Enable or disable parallel annotation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn progress_callback(&self) -> Arc<dyn ProgressCallback> {
        self.progress
            .clone()
            .unwrap_or_else(|| Arc::new(NoOpProgress))
    }
}

/// One saved, annotated keyframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedFrame {
    /// Index of the scene in the segmenter's output.
    pub scene_index: usize,
    /// Source frame the keyframe was decoded from.
    pub frame_number: u64,
    /// Where the watermarked frame was written.
    pub path: PathBuf,
    /// Text recognized in the frame before watermarking; may be empty.
    pub text: String,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Detected scenes, in order.
    pub scenes: Vec<Scene>,
    /// Annotated frames in scene order. Scenes whose keyframe failed to
    /// decode are absent.
    pub frames: Vec<AnnotatedFrame>,
    /// Non-empty per-scene texts joined with single spaces.
    pub text: String,
    /// The assembled animation.
    pub animation: Animation,
}

/// Per-scene work shared by the sequential and parallel paths.
pub(crate) struct SceneAnnotator {
    storage: OutputDirectory,
    extension: String,
    reader: SceneTextReader,
    watermarker: Watermarker,
}

impl SceneAnnotator {
    /// Extract, recognize, watermark and save one scene's keyframe.
    ///
    /// Returns `Ok(None)` when the keyframe cannot be decoded.
    pub(crate) fn annotate<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        scene_index: usize,
        scene: &Scene,
    ) -> Result<Option<AnnotatedFrame>, SceneReelError> {
        let keyframe = match extract_keyframe(source, scene_index, scene) {
            Ok(keyframe) => keyframe,
            Err(error) => {
                log::warn!("Skipping scene {scene_index}: keyframe extraction failed: {error}");
                return Ok(None);
            }
        };

        let frame_number = keyframe.frame_number;
        let dynamic = DynamicImage::ImageRgb8(keyframe.image);
        let text = match self.reader.read(&dynamic) {
            Ok(text) => text,
            Err(error) => {
                log::warn!("Text recognition failed for scene {scene_index}: {error}");
                String::new()
            }
        };

        let mut image = dynamic.into_rgb8();
        self.watermarker.apply(&mut image);
        let path = self
            .storage
            .save_scene(scene_index, &self.extension, &image)?;
        log::debug!("Saved scene {scene_index} to {} (text={text:?})", path.display());

        Ok(Some(AnnotatedFrame {
            scene_index,
            frame_number,
            path,
            text,
        }))
    }
}

/// Runs segmentation, annotation and assembly with one recognizer handle.
pub struct ScenePipeline {
    options: PipelineOptions,
    recognizer: Arc<dyn TextRecognizer>,
    watermarker: Watermarker,
}

impl ScenePipeline {
    /// Build a pipeline. The recognizer is shared by every scene of every
    /// run made with this pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::FontError`] if the watermark font cannot be
    /// loaded.
    pub fn new(
        options: PipelineOptions,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Result<Self, SceneReelError> {
        let watermarker = Watermarker::new(options.watermark.clone())?;
        Ok(Self {
            options,
            recognizer,
            watermarker,
        })
    }

    /// The options this pipeline was built with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    fn annotator(&self) -> Result<SceneAnnotator, SceneReelError> {
        Ok(SceneAnnotator {
            storage: OutputDirectory::create(&self.options.output_dir)?,
            extension: self.options.image_extension.clone(),
            reader: SceneTextReader::new(Arc::clone(&self.recognizer), self.options.charset),
            watermarker: self.watermarker.clone(),
        })
    }

    /// Run every stage on an already-open source, sequentially.
    ///
    /// # Errors
    ///
    /// Decoding errors during segmentation, storage errors, and assembly
    /// errors ([`SceneReelError::EmptyFrameSet`] when no keyframe survived,
    /// [`SceneReelError::FrameLoad`]) are returned. Per-scene decode and
    /// recognition failures are not.
    pub fn run<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<PipelineOutput, SceneReelError> {
        let annotator = self.annotator()?;
        let scenes = detect_scenes_with_progress(
            source,
            &self.options.scene,
            self.options.progress_callback(),
        )?;

        let mut tracker = ProgressTracker::new(
            self.options.progress_callback(),
            OperationType::KeyframeExtraction,
            Some(scenes.len() as u64),
            1,
        );
        let mut frames = Vec::with_capacity(scenes.len());
        for (scene_index, scene) in scenes.iter().enumerate() {
            if let Some(frame) = annotator.annotate(source, scene_index, scene)? {
                frames.push(frame);
            }
            tracker.advance(Some(scene.midpoint()));
        }

        self.finish(scenes, frames)
    }

    /// Open `path`, run every stage, and release the decoder.
    ///
    /// With the `rayon` feature and [`PipelineOptions::parallel`] set, scenes
    /// are annotated on worker threads, each with its own decoder.
    pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineOutput, SceneReelError> {
        let path = path.as_ref();

        #[cfg(feature = "rayon")]
        if self.options.parallel {
            let scenes = {
                let mut source = VideoSource::open(path)?;
                detect_scenes_with_progress(
                    &mut source,
                    &self.options.scene,
                    self.options.progress_callback(),
                )?
            };
            let annotator = self.annotator()?;
            let frames = crate::parallel::annotate_scenes(
                path,
                &scenes,
                &annotator,
                self.options.progress_callback(),
            )?;
            return self.finish(scenes, frames);
        }

        let mut source = VideoSource::open(path)?;
        self.run(&mut source)
    }

    fn finish(
        &self,
        scenes: Vec<Scene>,
        frames: Vec<AnnotatedFrame>,
    ) -> Result<PipelineOutput, SceneReelError> {
        let text = join_scene_text(&frames);
        log::info!(
            "Annotated {} of {} scenes ({} chars of text)",
            frames.len(),
            scenes.len(),
            text.len(),
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress_callback(),
            OperationType::GifExport,
            Some(1),
            1,
        );
        let paths: Vec<PathBuf> = frames.iter().map(|frame| frame.path.clone()).collect();
        let animation = assemble_animation(
            &paths,
            &self.options.output_dir,
            &self.options.animation,
        )?;
        tracker.advance(None);

        Ok(PipelineOutput {
            scenes,
            frames,
            text,
            animation,
        })
    }
}

/// Join non-empty per-scene texts with single spaces, in scene order.
pub fn join_scene_text(frames: &[AnnotatedFrame]) -> String {
    frames
        .iter()
        .map(|frame| frame.text.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
