//! Run-scoped output directory.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::SceneReelError;

/// The directory a run writes its frames and animation into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    root: PathBuf,
}

impl OutputDirectory {
    /// Create the directory (and any parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::IoError`] if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SceneReelError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        log::debug!("Using output directory {}", root.display());
        Ok(Self { root })
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of the annotated frame for scene `index`: `scene_<index>.<extension>`.
    pub fn scene_path(&self, index: usize, extension: &str) -> PathBuf {
        self.root.join(format!("scene_{index}.{extension}"))
    }

    /// Encode `image` to the scene frame path, format chosen by extension.
    pub fn save_scene(
        &self,
        index: usize,
        extension: &str,
        image: &RgbImage,
    ) -> Result<PathBuf, SceneReelError> {
        let path = self.scene_path(index, extension);
        image.save(&path)?;
        Ok(path)
    }
}
