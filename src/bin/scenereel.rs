use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use scenereel::{
    FfmpegLogLevel, FontSource, NullRecognizer, OperationType, PipelineOptions, PipelineOutput,
    ProgressCallback, ProgressInfo, RecognitionOptions, SceneDetectionOptions, ScenePipeline,
    SearchOptions, TesseractRecognizer, TextRecognizer, VideoDownloader, VideoSource,
    WatermarkOptions, YtDlp, detect_scenes, detect_scenes_with_progress, find_candidate, parse_duration,
};

const CLI_AFTER_HELP: &str = "Examples:\n  scenereel run \"rust conference keynote\" --out downloads\n  scenereel process talk.mp4 --out talk_scenes --progress\n  scenereel detect-scenes talk.mp4 --json --threshold 27\n  scenereel parse-duration 1:02:03\n  scenereel completions zsh > _scenereel";

#[derive(Debug, Parser)]
#[command(
    name = "scenereel",
    version,
    about = "Split videos into scenes, read their text, and build an animated preview",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show progress bars for long stages.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Skip text recognition.
    #[arg(long, global = true)]
    no_ocr: bool,

    /// Watermark label text.
    #[arg(long, global = true)]
    label: Option<String>,

    /// TrueType font file for the watermark (built-in face otherwise).
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Scene detection threshold (0-255).
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Minimum scene length in frames.
    #[arg(long, global = true)]
    min_scene_len: Option<u64>,

    /// Annotate scenes in parallel (requires the `rayon` feature).
    #[arg(long, global = true)]
    parallel: bool,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for a video, download it, and process it.
    #[command(
        about = "Search, download and process a video",
        after_help = "Examples:\n  scenereel run \"how to brew coffee\"\n  scenereel run \"lecture\" --out downloads --max-duration 300"
    )]
    Run {
        /// Free-text search query.
        query: String,
        /// Directory for downloads; results go to <out>/<video stem>.
        #[arg(long, default_value = "downloads")]
        out: PathBuf,
        /// Number of search results to consider.
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only accept videos shorter than this many seconds.
        #[arg(long, default_value_t = 600)]
        max_duration: u64,
    },

    /// Run the scene pipeline on a local video.
    #[command(
        about = "Process a local video",
        after_help = "Examples:\n  scenereel process input.mp4\n  scenereel process input.mp4 --out reel --label \"my channel\""
    )]
    Process {
        /// Input video path.
        video: PathBuf,
        /// Output directory (defaults to the video's file stem).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the detected scene list.
    #[command(
        about = "Detect scenes",
        visible_alias = "scenes",
        after_help = "Examples:\n  scenereel detect-scenes input.mp4\n  scenereel detect-scenes input.mp4 --json"
    )]
    DetectScenes {
        /// Input video path.
        video: PathBuf,
    },

    /// Convert a timestamp such as 1:02:03 to seconds.
    ParseDuration {
        /// Timestamp in ss, mm:ss or hh:mm:ss form.
        timestamp: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Renders progress snapshots with a single `indicatif` bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:>18} {bar:40.cyan/blue} {pos}/{len}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::SceneDetection => "detecting scenes",
            OperationType::KeyframeExtraction => "annotating",
            OperationType::GifExport => "writing animation",
            _ => "working",
        };
        self.bar.set_message(label);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        scenereel::set_ffmpeg_log_level(parsed);
    }

    #[cfg(not(feature = "rayon"))]
    if global.parallel {
        warn("--parallel requires building with the `rayon` feature; running sequentially");
    }

    Ok(())
}

fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

fn scene_options(global: &GlobalOptions) -> SceneDetectionOptions {
    let mut options = SceneDetectionOptions::new();
    if let Some(threshold) = global.threshold {
        options = options.threshold(threshold);
    }
    if let Some(frames) = global.min_scene_len {
        options = options.min_scene_len(frames);
    }
    options
}

fn pipeline_options(
    global: &GlobalOptions,
    output_dir: PathBuf,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> PipelineOptions {
    let mut watermark = WatermarkOptions::new();
    if let Some(label) = &global.label {
        watermark = watermark.with_label(label.clone());
    }
    if let Some(font) = &global.font {
        watermark = watermark.with_font(FontSource::File(font.clone()));
    }

    let mut options = PipelineOptions::new(output_dir)
        .with_scene_detection(scene_options(global))
        .with_watermark(watermark)
        .with_parallel(global.parallel);
    if let Some(progress) = progress {
        options = options.with_progress(progress);
    }
    options
}

fn recognizer(global: &GlobalOptions) -> Arc<dyn TextRecognizer> {
    if global.no_ocr {
        return Arc::new(NullRecognizer);
    }
    match TesseractRecognizer::new(RecognitionOptions::new()) {
        Ok(engine) => Arc::new(engine),
        Err(error) => {
            warn(&format!("{error}; continuing without text recognition (use --no-ocr to silence)"));
            Arc::new(NullRecognizer)
        }
    }
}

fn progress_callback(
    global: &GlobalOptions,
) -> Result<Option<Arc<dyn ProgressCallback>>, Box<dyn std::error::Error>> {
    if global.progress {
        Ok(Some(Arc::new(TerminalProgress::new()?)))
    } else {
        Ok(None)
    }
}

/// Default output directory for a video: its file stem next to `parent`.
fn output_dir_for(video: &Path, parent: Option<&Path>) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "scenereel".into());
    match parent {
        Some(parent) => parent.join(stem),
        None => PathBuf::from(stem),
    }
}

fn output_report(output: &PipelineOutput) -> Value {
    json!({
        "scenes": output.scenes.iter().map(|scene| json!({
            "start_frame": scene.start_frame,
            "end_frame": scene.end_frame,
        })).collect::<Vec<_>>(),
        "frames": output.frames.iter().map(|frame| json!({
            "scene_index": frame.scene_index,
            "frame_number": frame.frame_number,
            "path": frame.path.display().to_string(),
            "text": frame.text,
        })).collect::<Vec<_>>(),
        "text": output.text,
        "animation": {
            "path": output.animation.path.display().to_string(),
            "frame_count": output.animation.frame_count,
            "frame_duration_ms": output.animation.frame_duration_ms,
        },
    })
}

fn print_output(output: &PipelineOutput, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&output_report(output))?);
        return Ok(());
    }

    println!(
        "{} {} scenes, {} frames annotated",
        "done".green().bold(),
        output.scenes.len(),
        output.frames.len(),
    );
    if output.text.is_empty() {
        println!("{}", "no text detected".dimmed());
    } else {
        println!("{} {}", "text:".bold(), output.text);
    }
    println!("{} {}", "animation:".bold(), output.animation.path.display());
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Run {
            query,
            out,
            limit,
            max_duration,
        } => {
            let ytdlp = YtDlp::new();
            let search_options = SearchOptions::new()
                .with_limit(limit)
                .with_max_duration_seconds(max_duration);
            let candidate = find_candidate(&ytdlp, &query, &search_options)?;
            if !cli.global.json {
                println!(
                    "{} {} ({}s)",
                    "selected".cyan().bold(),
                    candidate.title,
                    candidate.duration_seconds(),
                );
            }

            let video = ytdlp.download(&candidate.link, &out)?;
            let options = pipeline_options(
                &cli.global,
                output_dir_for(&video, Some(&out)),
                progress_callback(&cli.global)?,
            );
            let pipeline = ScenePipeline::new(options, recognizer(&cli.global))?;
            let output = pipeline.run_file(&video)?;
            print_output(&output, cli.global.json)?;
        }
        Commands::Process { video, out } => {
            let output_dir = out.unwrap_or_else(|| output_dir_for(&video, None));
            let options =
                pipeline_options(&cli.global, output_dir, progress_callback(&cli.global)?);
            let pipeline = ScenePipeline::new(options, recognizer(&cli.global))?;
            let output = pipeline.run_file(&video)?;
            print_output(&output, cli.global.json)?;
        }
        Commands::DetectScenes { video } => {
            let mut source = VideoSource::open(&video)?;
            let options = scene_options(&cli.global);
            let scenes = match progress_callback(&cli.global)? {
                Some(progress) => detect_scenes_with_progress(&mut source, &options, progress)?,
                None => detect_scenes(&mut source, &options)?,
            };
            let frames_per_second = source.metadata().frames_per_second;

            if cli.global.json {
                let payload: Vec<_> = scenes
                    .iter()
                    .map(|scene| {
                        json!({
                            "start_frame": scene.start_frame,
                            "end_frame": scene.end_frame,
                            "keyframe": scene.midpoint(),
                            "start_seconds": seconds(scene.start_frame, frames_per_second),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (index, scene) in scenes.iter().enumerate() {
                    println!(
                        "scene {index}: frames {}..{} at {:.3}s (keyframe {})",
                        scene.start_frame,
                        scene.end_frame,
                        seconds(scene.start_frame, frames_per_second),
                        scene.midpoint(),
                    );
                }
            }
        }
        Commands::ParseDuration { timestamp } => {
            let seconds = parse_duration(&timestamp);
            if cli.global.json {
                println!("{}", json!({ "input": timestamp, "seconds": seconds }));
            } else {
                println!("{seconds}");
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "scenereel", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn seconds(frame_number: u64, frames_per_second: f64) -> f64 {
    if frames_per_second > 0.0 {
        frame_number as f64 / frames_per_second
    } else {
        0.0
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{
        Cli, GlobalOptions, output_dir_for, parse_log_level, pipeline_options, progress_callback,
        seconds,
    };
    use clap::Parser;
    use scenereel::FfmpegLogLevel;

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("quiet"), Some(FfmpegLogLevel::Quiet));
        assert_eq!(parse_log_level("WARN"), Some(FfmpegLogLevel::Warning));
        assert_eq!(parse_log_level("debug"), Some(FfmpegLogLevel::Debug));
        assert!(parse_log_level("trace").is_none());
    }

    #[test]
    fn output_dir_uses_video_stem() {
        assert_eq!(
            output_dir_for(Path::new("clips/talk.mp4"), None),
            PathBuf::from("talk")
        );
        assert_eq!(
            output_dir_for(Path::new("downloads/abc123.mp4"), Some(Path::new("downloads"))),
            PathBuf::from("downloads/abc123")
        );
    }

    #[test]
    fn global_flags_reach_pipeline_options() {
        let global = GlobalOptions {
            threshold: Some(27.0),
            min_scene_len: Some(0),
            label: Some("demo".to_string()),
            ..GlobalOptions::default()
        };
        let options = pipeline_options(&global, PathBuf::from("out"), None);
        assert_eq!(options.scene.threshold, 27.0);
        assert_eq!(options.scene.min_scene_len, 1);
        assert_eq!(options.watermark.label, "demo");
        assert!(options.progress.is_none());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["scenereel", "detect-scenes", "in.mp4", "--json"]).unwrap();
        assert!(cli.global.json);
    }

    #[test]
    fn progress_callback_only_when_requested() {
        assert!(progress_callback(&GlobalOptions::default()).unwrap().is_none());
        let global = GlobalOptions {
            progress: true,
            ..GlobalOptions::default()
        };
        assert!(progress_callback(&global).unwrap().is_some());
    }

    #[test]
    fn frame_to_seconds_guards_zero_rate() {
        assert_eq!(seconds(50, 25.0), 2.0);
        assert_eq!(seconds(50, 0.0), 0.0);
    }
}
