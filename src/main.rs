use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use audiogram::captions::{write_caption_file, CaptionInput};
use audiogram::config::{AppConfig, ConfigOverrides, Soundbite, TimeValue};
use audiogram::error_codes::{exit_code_for, usage_error, UsageCode, UsageError};
use audiogram::format::VideoFormat;
use audiogram::pipeline::{
    build_inputs, load_waveform, render_soundbite, render_still, RenderJob, RenderThreading,
};
use audiogram::selection::parse_soundbite_selection;
use audiogram::srt::{parse_srt_to_chunks, read_srt_file, transcript_text};
use audiogram::subtitles::TranscriptChunk;
use audiogram::text::face::FontSet;
use audiogram::theme::ColorTheme;
use audiogram::timecode::format_seconds;
use audiogram::waveform::WaveformTrack;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("AUDIOGRAM_GIT_HASH"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "audiogram")]
#[command(about = "Render podcast soundbites as social-media audiogram videos")]
#[command(version = VERSION)]
struct Cli {
    /// Debug-level logging (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print usage errors as a JSON envelope on stderr.
    #[arg(long, global = true)]
    json_errors: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render one video per soundbite and enabled format.
    Render(RenderArgs),
    /// Render a single frame as PNG.
    Still(StillArgs),
    /// List the selected soundbites without rendering.
    DryRun(SoundbiteArgs),
    /// Validate and summarise the configuration.
    Check(ConfigArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Still(_) => "still",
            Self::DryRun(_) => "dry-run",
            Self::Check(_) => "check",
        }
    }
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SoundbiteArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Soundbite start in the episode (seconds or HH:MM:SS,mmm).
    #[arg(long)]
    start: Option<String>,
    /// Soundbite length (seconds or HH:MM:SS,mmm).
    #[arg(long)]
    duration: Option<String>,
    /// Configured soundbites to use: "all", a number, or a comma list.
    #[arg(long)]
    soundbites: Option<String>,
    /// SRT transcript of the episode.
    #[arg(long)]
    srt: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StyleArgs {
    #[arg(long)]
    logo: Option<PathBuf>,
    #[arg(long)]
    podcast_title: Option<String>,
    #[arg(long)]
    episode_title: Option<String>,
    /// Formats to render (vertical, square, horizontal). Repeatable.
    #[arg(long = "format", value_delimiter = ',')]
    formats: Vec<String>,
    #[arg(long)]
    cta: Option<String>,
    #[arg(long)]
    header_text: Option<String>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    no_subtitles: bool,
    #[arg(long)]
    progress_bar: bool,
    #[arg(long)]
    debug_safe_area: bool,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    soundbite: SoundbiteArgs,
    #[command(flatten)]
    style: StyleArgs,
    /// Episode audio file.
    #[arg(long)]
    audio: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// File name prefix for outputs.
    #[arg(long)]
    prefix: Option<String>,
    /// Render worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Args)]
struct StillArgs {
    #[command(flatten)]
    soundbite: SoundbiteArgs,
    #[command(flatten)]
    style: StyleArgs,
    /// Episode audio; without it the equalizer is left empty.
    #[arg(long)]
    audio: Option<PathBuf>,
    /// Clip-relative time of the frame.
    #[arg(long, default_value = "0")]
    time: String,
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.name();
    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Still(args) => run_still(args),
        Commands::DryRun(args) => run_dry_run(args),
        Commands::Check(args) => run_check(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match usage_error(&error).filter(|_| cli.json_errors) {
                Some(usage) => match usage.to_json_line() {
                    Ok(line) => eprintln!("{line}"),
                    Err(_) => eprintln!("audiogram {command}: {error:#}"),
                },
                None => eprintln!("audiogram {command}: {error:#}"),
            }
            ExitCode::from(exit_code_for(&error) as u8)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args, &ConfigOverrides::default())?;
    let origin = args
        .config
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_owned());

    println!("OK: {origin} ({} fps, output {})", config.fps, config.output_dir.display());
    for settings in &config.formats {
        let spec = &settings.spec;
        let safe = match spec.safe_area {
            Some(insets) => format!(
                ", safe area l{} r{} t{} b{}",
                insets.left, insets.right, insets.top, insets.bottom
            ),
            None => String::new(),
        };
        println!(
            "  {:<10} {}x{} {}{}",
            spec.format.keyword(),
            spec.width,
            spec.height,
            if settings.enabled { "enabled" } else { "disabled" },
            safe
        );
    }
    println!("Soundbites: {}", config.soundbites.len());
    Ok(())
}

fn run_dry_run(args: SoundbiteArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        transcript: args.srt.clone(),
        ..ConfigOverrides::default()
    };
    let config = load_config(&args.config, &overrides)?;
    let srt = read_transcript(&config)?;

    for (number, soundbite) in select_soundbites(&args, &config)? {
        println!(
            "Soundbite {number}: start {} duration {} end {}",
            format_seconds(soundbite.start),
            format_seconds(soundbite.duration),
            format_seconds(soundbite.end())
        );
        if let Some(title) = &soundbite.title {
            println!("  title: {title}");
        }
        let text = soundbite_text(&soundbite, srt.as_deref());
        println!("  text: {}", text.as_deref().unwrap_or("(none)"));
    }
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<()> {
    let mut overrides = style_overrides(&args.style, &args.soundbite)?;
    overrides.output_dir.clone_from(&args.output_dir);
    let config = load_config(&args.soundbite.config, &overrides)?;

    let audio = args
        .audio
        .clone()
        .or_else(|| config.podcast.audio.clone())
        .ok_or_else(|| {
            UsageError::new(UsageCode::MissingAudio, "render needs --audio or podcast.audio")
        })?;
    let srt = read_transcript(&config)?;
    let soundbites = select_soundbites(&args.soundbite, &config)?;
    let fonts = FontSet::resolve(config.fonts.regular.as_deref(), config.fonts.bold.as_deref());
    let prefix = args.prefix.clone().unwrap_or_else(|| default_prefix(&config));

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;

    for (number, soundbite) in &soundbites {
        info!(
            soundbite = number,
            start = %format_seconds(soundbite.start),
            duration = soundbite.duration,
            "processing soundbite"
        );
        let chunks = soundbite_chunks(soundbite, srt.as_deref());

        for settings in config.enabled_formats() {
            let mut job = base_job(&config, &fonts, settings.spec, soundbite, chunks.clone());
            job.audio = Some(audio.clone());
            job.threading = RenderThreading {
                threads: args.threads,
                ..RenderThreading::default()
            };
            let output = config.output_dir.join(format!(
                "{prefix}_{number}_{}.mp4",
                settings.spec.format.keyword()
            ));
            render_soundbite(&job, &output)
                .with_context(|| format!("soundbite {number} ({})", settings.spec.format.keyword()))?;
            println!("Wrote {}", output.display());
        }

        let transcript = soundbite_text(soundbite, srt.as_deref());
        let caption_path = config.output_dir.join(format!("{prefix}_{number}.txt"));
        write_caption_file(
            &caption_path,
            &CaptionInput {
                episode_number: config.podcast.episode_number,
                episode_title: config.podcast.episode_title.as_deref().unwrap_or_default(),
                episode_link: config.podcast.episode_link.as_deref(),
                soundbite_title: soundbite.title.as_deref(),
                transcript_text: transcript.as_deref(),
                podcast_keywords: config.podcast.keywords.as_deref(),
                episode_keywords: config.podcast.episode_keywords.as_deref(),
                config_hashtags: &config.hashtags,
            },
        )
        .with_context(|| format!("failed to write {}", caption_path.display()))?;
        println!("Wrote {}", caption_path.display());
    }
    Ok(())
}

fn run_still(args: StillArgs) -> Result<()> {
    let overrides = style_overrides(&args.style, &args.soundbite)?;
    let config = load_config(&args.soundbite.config, &overrides)?;
    let t = parse_time_arg("time", &args.time)?;

    let srt = read_transcript(&config)?;
    let soundbites = select_soundbites(&args.soundbite, &config)?;
    let Some((number, soundbite)) = soundbites.into_iter().next() else {
        return Err(UsageError::new(UsageCode::NoSoundbites, "no soundbite selected").into());
    };
    let fonts = FontSet::resolve(config.fonts.regular.as_deref(), config.fonts.bold.as_deref());
    let chunks = soundbite_chunks(&soundbite, srt.as_deref());
    let audio = args.audio.clone().or_else(|| config.podcast.audio.clone());

    let enabled: Vec<_> = config.enabled_formats().collect();
    for settings in &enabled {
        let mut job = base_job(&config, &fonts, settings.spec, &soundbite, chunks.clone());
        job.audio.clone_from(&audio);
        let waveform = if job.audio.is_some() {
            load_waveform(&job)?
        } else {
            warn!("no audio given, equalizer bars are omitted");
            WaveformTrack::default()
        };
        let output = if enabled.len() == 1 {
            args.output.clone()
        } else {
            with_suffix(&args.output, settings.spec.format.keyword())
        };
        let report = render_still(build_inputs(&job, waveform), t, &output)
            .with_context(|| format!("soundbite {number} ({})", settings.spec.format.keyword()))?;
        println!(
            "Wrote {} (bars {}, subtitle lines {})",
            output.display(),
            report.bar_count,
            report.subtitle_lines.len()
        );
    }
    Ok(())
}

fn load_config(args: &ConfigArgs, overrides: &ConfigOverrides) -> Result<AppConfig> {
    let config = AppConfig::load(args.config.as_deref(), overrides)?;
    Ok(config)
}

fn style_overrides(style: &StyleArgs, soundbite: &SoundbiteArgs) -> Result<ConfigOverrides> {
    let formats = if style.formats.is_empty() {
        None
    } else {
        let parsed = style
            .formats
            .iter()
            .map(|value| {
                VideoFormat::from_keyword(value).ok_or_else(|| {
                    UsageError::new(UsageCode::UnknownFormat, format!("unknown format '{value}'"))
                        .with_details(json!({ "value": value, "expected": ["vertical", "square", "horizontal"] }))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Some(parsed)
    };

    Ok(ConfigOverrides {
        fps: style.fps,
        call_to_action: style.cta.clone(),
        header_text: style.header_text.clone(),
        show_subtitles: style.no_subtitles.then_some(false),
        progress_bar: style.progress_bar.then_some(true),
        formats,
        debug_safe_area: style.debug_safe_area.then_some(true),
        podcast_title: style.podcast_title.clone(),
        episode_title: style.episode_title.clone(),
        logo: style.logo.clone(),
        transcript: soundbite.srt.clone(),
        ..ConfigOverrides::default()
    })
}

fn parse_time_arg(name: &str, value: &str) -> Result<f64, UsageError> {
    TimeValue::Timestamp(value.to_owned())
        .seconds()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| {
            UsageError::new(
                UsageCode::InvalidTime,
                format!("--{name} '{value}' is not a valid time"),
            )
            .with_details(json!({ "flag": name, "value": value }))
        })
}

/// `--start`/`--duration` win; otherwise the configured soundbites filtered
/// by `--soundbites`. Numbers are 1-based.
fn select_soundbites(
    args: &SoundbiteArgs,
    config: &AppConfig,
) -> Result<Vec<(usize, Soundbite)>, UsageError> {
    if let Some(start) = &args.start {
        let start = parse_time_arg("start", start)?;
        let duration = match &args.duration {
            Some(value) => parse_time_arg("duration", value)?,
            None => {
                return Err(UsageError::new(
                    UsageCode::MissingDuration,
                    "--start needs --duration",
                ))
            }
        };
        if duration <= 0.0 {
            return Err(UsageError::new(
                UsageCode::InvalidTime,
                "--duration must be greater than zero",
            ));
        }
        return Ok(vec![(
            1,
            Soundbite {
                start,
                duration,
                title: None,
                text: None,
            },
        )]);
    }

    if config.soundbites.is_empty() {
        return Err(UsageError::new(
            UsageCode::NoSoundbites,
            "give --start and --duration or list soundbites in the configuration",
        ));
    }
    let selected = parse_soundbite_selection(args.soundbites.as_deref(), config.soundbites.len())?;
    Ok(selected
        .into_iter()
        .map(|number| (number, config.soundbites[number - 1].clone()))
        .collect())
}

fn read_transcript(config: &AppConfig) -> Result<Option<String>> {
    match config.podcast.transcript.as_deref() {
        Some(path) => Ok(Some(read_srt_file(path)?)),
        None => Ok(None),
    }
}

fn soundbite_chunks(soundbite: &Soundbite, srt: Option<&str>) -> Vec<TranscriptChunk> {
    match srt {
        Some(text) => parse_srt_to_chunks(text, soundbite.start, soundbite.duration),
        // Configured text with no transcript covers the whole clip.
        None => soundbite
            .text
            .iter()
            .map(|text| TranscriptChunk::new(0.0, soundbite.duration, text.clone()))
            .collect(),
    }
}

fn soundbite_text(soundbite: &Soundbite, srt: Option<&str>) -> Option<String> {
    srt.and_then(|text| transcript_text(text, soundbite.start, soundbite.duration))
        .or_else(|| soundbite.text.clone())
}

fn base_job(
    config: &AppConfig,
    fonts: &FontSet,
    spec: audiogram::format::FormatSpec,
    soundbite: &Soundbite,
    chunks: Vec<TranscriptChunk>,
) -> RenderJob {
    let mut job = RenderJob::new(spec, config.fps, soundbite.start, soundbite.duration);
    job.theme = ColorTheme::resolve(Some(&config.colors));
    job.fonts = fonts.clone();
    job.logo.clone_from(&config.podcast.logo);
    job.podcast_title = config.podcast.title.clone().unwrap_or_default();
    job.episode_title = config.podcast.episode_title.clone().unwrap_or_default();
    job.header_text.clone_from(&config.header_text);
    job.call_to_action.clone_from(&config.call_to_action);
    job.chunks = chunks;
    job.show_subtitles = config.show_subtitles;
    job.progress_bar = config.progress_bar;
    job
}

fn default_prefix(config: &AppConfig) -> String {
    match config.podcast.episode_number {
        Some(number) => format!("ep{number}"),
        None => "audiogram".to_owned(),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_owned());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}
