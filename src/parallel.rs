//! Parallel scene annotation.
//!
//! Scenes are split into contiguous chunks, one per rayon thread. Each
//! worker opens its own [`VideoSource`] onto the file, so no decoder state
//! is shared. Results are returned in scene order.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use ::rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::SceneReelError,
    pipeline::{AnnotatedFrame, SceneAnnotator},
    progress::{OperationType, ProgressCallback, ProgressTracker},
    scene::Scene,
    source::VideoSource,
};

/// Annotate every scene of `file_path` on the rayon pool.
pub(crate) fn annotate_scenes(
    file_path: &Path,
    scenes: &[Scene],
    annotator: &SceneAnnotator,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Vec<AnnotatedFrame>, SceneReelError> {
    if scenes.is_empty() {
        return Ok(Vec::new());
    }

    let chunks = split_into_chunks(scenes.len(), ::rayon::current_num_threads());
    log::debug!(
        "Annotating {} scenes on {} workers",
        scenes.len(),
        chunks.len(),
    );

    let tracker = Mutex::new(ProgressTracker::new(
        progress,
        OperationType::KeyframeExtraction,
        Some(scenes.len() as u64),
        1,
    ));

    let results: Result<Vec<Vec<AnnotatedFrame>>, SceneReelError> = chunks
        .into_par_iter()
        .map(|(start, end)| {
            let mut source = VideoSource::open(file_path)?;
            let mut frames = Vec::with_capacity(end - start);
            for (scene_index, scene) in scenes.iter().enumerate().take(end).skip(start) {
                if let Some(frame) = annotator.annotate(&mut source, scene_index, scene)? {
                    frames.push(frame);
                }
                if let Ok(mut tracker) = tracker.lock() {
                    tracker.advance(Some(scene.midpoint()));
                }
            }
            Ok(frames)
        })
        .collect();

    let mut frames: Vec<AnnotatedFrame> = results?.into_iter().flatten().collect();
    frames.sort_by_key(|frame| frame.scene_index);
    Ok(frames)
}

/// Split `0..count` into at most `workers` contiguous `(start, end)` ranges.
fn split_into_chunks(count: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.clamp(1, count.max(1));
    let chunk_size = count.div_ceil(workers);
    (0..count)
        .step_by(chunk_size.max(1))
        .map(|start| (start, (start + chunk_size).min(count)))
        .collect()
}
