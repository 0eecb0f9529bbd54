//! Decodable video sources.
//!
//! [`FrameSource`] is the seam between the pipeline and the decoder: the
//! segmenter consumes it sequentially through
//! [`scan_frames`](FrameSource::scan_frames) and the keyframe extractor uses
//! random access through [`frame`](FrameSource::frame).
//!
//! [`VideoSource`] is the FFmpeg-backed implementation. It owns the demuxer
//! context for one file and is the only decoder resource a run holds: both
//! segmentation and extraction go through it, and everything it opened is
//! released when it is dropped, on success and on every error path.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{conversion, error::SceneReelError, metadata::VideoMetadata};

/// A frame-by-frame decodable video with random access by frame index.
///
/// Implementations are used by one caller at a time (`&mut self`): a seek
/// followed by a read must not be interleaved with another caller's seek.
pub trait FrameSource {
    /// Decode every frame from the start, in presentation order.
    ///
    /// Each frame is passed to `visitor` with its zero-based index. When
    /// `analysis_width` is set, frames wider than it are downscaled to that
    /// width (aspect preserved) before being handed over. Returns the number
    /// of frames decoded.
    fn scan_frames(
        &mut self,
        analysis_width: Option<u32>,
        visitor: &mut dyn FnMut(u64, &RgbImage) -> Result<(), SceneReelError>,
    ) -> Result<u64, SceneReelError>;

    /// Seek to `frame_number` and decode exactly that frame at full resolution.
    fn frame(&mut self, frame_number: u64) -> Result<RgbImage, SceneReelError>;

    /// Best-known frame count, used for progress reporting only.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

/// An opened video file.
///
/// Created via [`VideoSource::open`]. Holds the demuxer context and cached
/// [`VideoMetadata`].
///
/// # Example
///
/// ```no_run
/// use scenereel::{FrameSource, VideoSource};
///
/// let mut source = VideoSource::open("input.mp4")?;
/// let frame = source.frame(42)?;
/// frame.save("frame_42.png")?;
/// # Ok::<(), scenereel::SceneReelError>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    metadata: VideoMetadata,
    decoded_frame_count: Option<u64>,
    file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("decoded_frame_count", &self.decoded_frame_count)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::FileOpen`] if the file cannot be opened or
    /// its codec parameters cannot be read, and
    /// [`SceneReelError::NoVideoStream`] if it contains no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SceneReelError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| SceneReelError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| SceneReelError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(SceneReelError::NoVideoStream)?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| SceneReelError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to read video codec parameters: {error}"),
            },
        )?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| SceneReelError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let frame_count = match stream.frames() {
            count if count > 0 => count as u64,
            _ if frames_per_second > 0.0 => (duration.as_secs_f64() * frames_per_second) as u64,
            _ => 0,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
            format: input_context.format().name().to_string(),
            stream_index,
        };

        log::info!(
            "Opened video file: {} ({}x{}, {:.2} fps, ~{} frames, codec={})",
            file_path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            metadata,
            decoded_frame_count: None,
            file_path,
        })
    }

    /// Get the cached stream metadata.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Exact number of frames, known once a full [`scan_frames`](FrameSource::scan_frames)
    /// pass has completed.
    pub fn decoded_frame_count(&self) -> Option<u64> {
        self.decoded_frame_count
    }

    /// Build a fresh decoder for the video stream.
    fn open_decoder(&self) -> Result<VideoDecoder, SceneReelError> {
        let stream = self
            .input_context
            .stream(self.metadata.stream_index)
            .ok_or(SceneReelError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        Ok(decoder_context.decoder().video()?)
    }

    fn seek_to_frame(&mut self, frame_number: u64) -> Result<(), SceneReelError> {
        let target = conversion::frame_number_to_seek_timestamp(
            frame_number,
            self.metadata.frames_per_second,
        );
        log::debug!("Seeking to frame {frame_number} (ts={target})");
        self.input_context.seek(target, ..target)?;
        Ok(())
    }
}

impl FrameSource for VideoSource {
    fn scan_frames(
        &mut self,
        analysis_width: Option<u32>,
        visitor: &mut dyn FnMut(u64, &RgbImage) -> Result<(), SceneReelError>,
    ) -> Result<u64, SceneReelError> {
        let stream_index = self.metadata.stream_index;
        let mut decoder = self.open_decoder()?;
        let (output_width, output_height) =
            conversion::scaled_dimensions(decoder.width(), decoder.height(), analysis_width);

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            output_width,
            output_height,
            ScalingFlags::AREA,
        )?;

        self.seek_to_frame(0)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let mut frame_number: u64 = 0;

        let mut emit = |decoded: &VideoFrame,
                        frame_number: &mut u64|
         -> Result<(), SceneReelError> {
            scaler.run(decoded, &mut rgb_frame)?;
            let image = convert_frame_to_image(&rgb_frame, output_width, output_height)?;
            visitor(*frame_number, &image)?;
            *frame_number += 1;
            Ok(())
        };

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|e| SceneReelError::VideoDecodeError(e.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                emit(&decoded_frame, &mut frame_number)?;
            }
        }

        decoder
            .send_eof()
            .map_err(|e| SceneReelError::VideoDecodeError(e.to_string()))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            emit(&decoded_frame, &mut frame_number)?;
        }

        log::debug!(
            "Scanned {} frames from {}",
            frame_number,
            self.file_path.display()
        );
        self.decoded_frame_count = Some(frame_number);
        Ok(frame_number)
    }

    fn frame(&mut self, frame_number: u64) -> Result<RgbImage, SceneReelError> {
        let total_frames = self
            .decoded_frame_count
            .unwrap_or(self.metadata.frame_count);
        if total_frames > 0 && frame_number >= total_frames {
            return Err(SceneReelError::FrameOutOfRange {
                frame_number,
                total_frames,
            });
        }

        let stream_index = self.metadata.stream_index;
        let frames_per_second = self.metadata.frames_per_second;
        let width = self.metadata.width;
        let height = self.metadata.height;
        let time_base = self
            .input_context
            .stream(stream_index)
            .ok_or(SceneReelError::NoVideoStream)?
            .time_base();

        let mut decoder = self.open_decoder()?;
        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        self.seek_to_frame(frame_number)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        // Seeking lands on the keyframe at or before the target; decode
        // forward and take the first frame at or past it.
        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|e| SceneReelError::VideoDecodeError(e.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);
                if current >= frame_number {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, width, height);
                }
            }
        }

        decoder
            .send_eof()
            .map_err(|e| SceneReelError::VideoDecodeError(e.to_string()))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.pts().unwrap_or(0);
            let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);
            if current >= frame_number {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, width, height);
            }
        }

        Err(SceneReelError::VideoDecodeError(format!(
            "Could not locate frame {frame_number} in the video stream"
        )))
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.decoded_frame_count
            .or(Some(self.metadata.frame_count).filter(|&count| count > 0))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        log::debug!("Releasing video source {}", self.file_path.display());
    }
}

/// Convert a scaled RGB24 video frame to an [`RgbImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<RgbImage, SceneReelError> {
    let buffer = conversion::frame_to_rgb_buffer(rgb_frame, width, height);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SceneReelError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}
