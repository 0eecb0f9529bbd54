//! Fetching a selected candidate to local storage.

use std::path::{Path, PathBuf};

use crate::error::SceneReelError;

/// Fetches a video to a local file.
pub trait VideoDownloader {
    /// Download `link` into `directory` and return the local file path.
    ///
    /// # Errors
    ///
    /// Returns [`SceneReelError::DownloadError`] when the fetch fails.
    fn download(&self, link: &str, directory: &Path) -> Result<PathBuf, SceneReelError>;
}
