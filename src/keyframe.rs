//! Keyframe selection and extraction.
//!
//! Each [`Scene`] is represented by the frame at its midpoint,
//! `start + (end - start) / 2`, which rounds toward the start of the scene
//! when the length is even.

use image::RgbImage;

use crate::{error::SceneReelError, scene::Scene, source::FrameSource};

/// The representative frame of one scene.
///
/// Watermarking mutates [`image`](Keyframe::image) in place; the keyframe
/// is then written to storage and dropped.
#[derive(Debug, Clone)]
pub struct Keyframe {
    /// Index of the scene in the segmenter's output.
    pub scene_index: usize,
    /// Frame number the image was decoded from.
    pub frame_number: u64,
    /// Decoded pixels at source resolution.
    pub image: RgbImage,
}

/// Keyframe indices for a scene list, one per scene, in scene order.
pub fn keyframe_indices(scenes: &[Scene]) -> Vec<u64> {
    scenes.iter().map(Scene::midpoint).collect()
}

/// Seek to the midpoint of `scene` and decode that single frame.
///
/// # Errors
///
/// Returns the source's error when the seek or decode fails (end of stream,
/// corrupt frame). Callers treat this as a per-scene failure.
pub fn extract_keyframe<S: FrameSource + ?Sized>(
    source: &mut S,
    scene_index: usize,
    scene: &Scene,
) -> Result<Keyframe, SceneReelError> {
    let frame_number = scene.midpoint();
    log::debug!(
        "Extracting keyframe {frame_number} for scene {scene_index} [{}, {})",
        scene.start_frame,
        scene.end_frame,
    );
    let image = source.frame(frame_number)?;
    Ok(Keyframe {
        scene_index,
        frame_number,
        image,
    })
}
