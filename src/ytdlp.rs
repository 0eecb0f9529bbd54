//! `yt-dlp` backed search and download.
//!
//! Both operations shell out to the `yt-dlp` executable (override with
//! `$YTDLP_CMD`). Search uses the `ytsearch<N>:` pseudo-URL and prints one
//! tab-separated line per result; download prefers a progressive mp4 stream
//! (video and audio muxed together) and prints the final file path.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    download::VideoDownloader,
    error::SceneReelError,
    search::{Candidate, VideoSearch},
};

const SEARCH_TEMPLATE: &str = "%(title)s\t%(webpage_url)s\t%(duration_string)s";
const PROGRESSIVE_MP4: &str =
    "best[ext=mp4][vcodec!=none][acodec!=none]/best[ext=mp4]/best";

/// Handle to the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    command: OsString,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            command: env::var_os("YTDLP_CMD").unwrap_or_else(|| OsString::from("yt-dlp")),
        }
    }
}

impl YtDlp {
    /// Use `$YTDLP_CMD`, or `yt-dlp` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable.
    pub fn with_command(command: impl Into<OsString>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, args: &[OsString]) -> Result<String, String> {
        let output = Command::new(&self.command)
            .args(args)
            .output()
            .map_err(|error| format!("failed to run {}: {error}", self.command.to_string_lossy()))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parse the search output, one `title \t url \t duration` line per
    /// result. Lines without a link are dropped; a missing duration is kept
    /// as an empty string.
    pub fn parse_search_output(output: &str) -> Vec<Candidate> {
        output
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('\t');
                let title = fields.next()?.trim();
                let link = fields.next()?.trim();
                if link.is_empty() || link == "NA" {
                    return None;
                }
                let duration = fields.next().map(str::trim).unwrap_or_default();
                Some(Candidate {
                    title: title.to_string(),
                    link: link.to_string(),
                    duration: if duration == "NA" { "" } else { duration }.to_string(),
                })
            })
            .collect()
    }
}

impl VideoSearch for YtDlp {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SceneReelError> {
        let search_query = format!("ytsearch{limit}:{query}");
        log::debug!("Searching with yt-dlp: {search_query}");

        let args: Vec<OsString> = vec![
            "--print".into(),
            SEARCH_TEMPLATE.into(),
            "--no-download".into(),
            "--no-warnings".into(),
            "--".into(),
            search_query.into(),
        ];
        let stdout = self.run(&args).map_err(SceneReelError::SearchError)?;
        Ok(Self::parse_search_output(&stdout))
    }
}

impl VideoDownloader for YtDlp {
    fn download(&self, link: &str, directory: &Path) -> Result<PathBuf, SceneReelError> {
        std::fs::create_dir_all(directory)?;
        log::info!("Downloading {link} into {}", directory.display());

        let args: Vec<OsString> = vec![
            "-f".into(),
            PROGRESSIVE_MP4.into(),
            "-o".into(),
            directory.join("%(id)s.%(ext)s").into_os_string(),
            "--no-simulate".into(),
            "--print".into(),
            "after_move:filepath".into(),
            "--no-warnings".into(),
            "--".into(),
            link.into(),
        ];
        let stdout = self.run(&args).map_err(SceneReelError::DownloadError)?;

        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| SceneReelError::DownloadError(format!("no file reported for {link}")))?;
        if !path.exists() {
            return Err(SceneReelError::DownloadError(format!(
                "reported file {} does not exist",
                path.display()
            )));
        }
        Ok(path)
    }
}
