//! Control over FFmpeg's own console output.
//!
//! Decoding a damaged or unusual stream makes FFmpeg print to stderr on its
//! own, independently of the `log` facade. [`set_ffmpeg_log_level`] tunes
//! that output; the CLI exposes it as `--log-level`.

use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg console verbosity, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// No output.
    Quiet,
    /// Unrecoverable and recoverable errors.
    #[default]
    Error,
    /// Errors and warnings (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Everything, including decoder debugging.
    Debug,
}

impl FfmpegLogLevel {
    fn level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(format!(
                "unknown log level '{other}', expected quiet, error, warning, info or debug"
            )),
        }
    }
}

/// Set FFmpeg's console verbosity. Does not affect `log` output.
///
/// ```no_run
/// scenereel::set_ffmpeg_log_level(scenereel::FfmpegLogLevel::Quiet);
/// ```
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.level());
}
