//! Internal timestamp and pixel-buffer helpers.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg rows frequently carry padding (stride > width × 3); the padding is
/// dropped so the result can go straight into [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
    for row in 0..(height as usize) {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base).max(0.0);
    (seconds * frames_per_second).round() as u64
}

/// Convert a frame number to a seek target in AV_TIME_BASE (microseconds).
///
/// `Input::seek` with no stream selected expects container-level
/// timestamps, so the stream time base is bypassed entirely.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Output dimensions for a frame scaled to `target_width`, keeping aspect ratio.
///
/// Never upscales and never returns a zero dimension.
pub(crate) fn scaled_dimensions(width: u32, height: u32, target_width: Option<u32>) -> (u32, u32) {
    match target_width {
        Some(target) if target > 0 && target < width => {
            let ratio = target as f64 / width as f64;
            let scaled_height = (height as f64 * ratio).round() as u32;
            (target, scaled_height.max(1))
        }
        _ => (width.max(1), height.max(1)),
    }
}
