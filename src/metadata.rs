//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and cached for the lifetime of the source.

use std::time::Duration;

/// Metadata for the video stream of an opened file.
///
/// # Example
///
/// ```no_run
/// use scenereel::VideoSource;
///
/// let source = VideoSource::open("input.mp4").unwrap();
/// let metadata = source.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    ///
    /// The exact count is only known after a full decode pass; see
    /// [`VideoSource::decoded_frame_count`](crate::VideoSource::decoded_frame_count).
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
