//! YAML configuration: file values deep-merged over built-in defaults, then
//! CLI overrides on top, then validated into an [`AppConfig`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::composer::DEFAULT_HEADER_TEXT;
use crate::error::{CollabResult, CollaboratorError};
use crate::format::{FormatSpec, SafeInsetsPx, VideoFormat};
use crate::theme::ThemeConfig;
use crate::timecode::parse_srt_time;

pub const DEFAULT_FPS: u32 = 24;
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// A time given either as seconds or as an `HH:MM:SS[,mmm]` string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Timestamp(String),
}

impl TimeValue {
    pub fn seconds(&self) -> CollabResult<f64> {
        match self {
            Self::Seconds(value) => Ok(*value),
            Self::Timestamp(text) => match text.trim().parse::<f64>() {
                Ok(value) => Ok(value),
                Err(_) => parse_srt_time(text)
                    .map_err(|_| CollaboratorError::config(format!("invalid time '{text}'"))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SoundbiteFile {
    pub start: TimeValue,
    pub duration: TimeValue,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormatFile {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
    pub safe_area: Option<SafeInsetsPx>,
    pub debug_safe_area: Option<bool>,
}

impl FormatFile {
    fn merge(&mut self, other: &FormatFile) {
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.height.is_some() {
            self.height = other.height;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.description.is_some() {
            self.description.clone_from(&other.description);
        }
        if other.safe_area.is_some() {
            self.safe_area = other.safe_area;
        }
        if other.debug_safe_area.is_some() {
            self.debug_safe_area = other.debug_safe_area;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormatsFile {
    pub vertical: Option<FormatFile>,
    pub square: Option<FormatFile>,
    pub horizontal: Option<FormatFile>,
}

impl FormatsFile {
    fn entry(&self, format: VideoFormat) -> Option<&FormatFile> {
        match format {
            VideoFormat::Vertical => self.vertical.as_ref(),
            VideoFormat::Square => self.square.as_ref(),
            VideoFormat::Horizontal => self.horizontal.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FontsConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

/// Episode metadata that would otherwise come from a feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PodcastInfo {
    pub title: Option<String>,
    pub episode_title: Option<String>,
    pub episode_number: Option<u32>,
    pub episode_link: Option<String>,
    pub keywords: Option<String>,
    pub episode_keywords: Option<String>,
    pub logo: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
}

/// The file as written by the user; every key optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub output_dir: Option<PathBuf>,
    pub fps: Option<u32>,
    pub colors: Option<ThemeConfig>,
    pub formats: Option<FormatsFile>,
    pub fonts: Option<FontsConfig>,
    /// `""` disables the header text.
    pub header_text: Option<String>,
    pub call_to_action: Option<String>,
    pub show_subtitles: Option<bool>,
    pub progress_bar: Option<bool>,
    pub hashtags: Option<Vec<String>>,
    pub soundbites: Option<Vec<SoundbiteFile>>,
    pub podcast: Option<PodcastInfo>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Soundbite {
    pub start: f64,
    pub duration: f64,
    pub title: Option<String>,
    pub text: Option<String>,
}

impl Soundbite {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatSettings {
    pub spec: FormatSpec,
    pub enabled: bool,
    pub description: String,
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub fps: u32,
    pub colors: ThemeConfig,
    /// Always the three formats, in [`VideoFormat::ALL`] order.
    pub formats: Vec<FormatSettings>,
    pub fonts: FontsConfig,
    pub header_text: Option<String>,
    pub call_to_action: Option<String>,
    pub show_subtitles: bool,
    pub progress_bar: bool,
    pub hashtags: Vec<String>,
    pub soundbites: Vec<Soundbite>,
    pub podcast: PodcastInfo,
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub fps: Option<u32>,
    pub call_to_action: Option<String>,
    pub header_text: Option<String>,
    pub show_subtitles: Option<bool>,
    pub progress_bar: Option<bool>,
    /// Restrict rendering to these formats.
    pub formats: Option<Vec<VideoFormat>>,
    pub debug_safe_area: Option<bool>,
    pub podcast_title: Option<String>,
    pub episode_title: Option<String>,
    pub logo: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_yaml_str(text: &str, origin: &str) -> CollabResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|error| {
            let location = error
                .location()
                .map(|location| format!("line {}, column {}", location.line(), location.column()))
                .unwrap_or_else(|| "unknown location".to_owned());
            CollaboratorError::config(format!(
                "failed to parse yaml in {origin} at {location}: {error}"
            ))
        })
    }

    pub fn load(path: &Path) -> CollabResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| {
            CollaboratorError::config(format!("failed to read {}: {error}", path.display()))
        })?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }
}

impl AppConfig {
    /// Defaults, then `path` (when given and present), then `overrides`.
    ///
    /// A path that does not exist falls back to the defaults with a warning.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> CollabResult<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                warn!(path = %path.display(), "configuration file not found, using defaults");
                ConfigFile::default()
            }
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                ConfigFile::load(path)?
            }
            None => ConfigFile::default(),
        };
        Self::resolve(file, overrides)
    }

    pub fn resolve(file: ConfigFile, overrides: &ConfigOverrides) -> CollabResult<Self> {
        for key in file.unknown.keys() {
            warn!(key = %key, "ignoring unknown configuration key");
        }

        let fps = overrides.fps.or(file.fps).unwrap_or(DEFAULT_FPS);
        if fps == 0 {
            return Err(CollaboratorError::config("fps must be greater than zero"));
        }

        let mut colors = ThemeConfig::default();
        if let Some(file_colors) = &file.colors {
            colors.merge(file_colors);
        }

        let formats_file = file.formats.unwrap_or_default();
        let mut formats = Vec::with_capacity(VideoFormat::ALL.len());
        for format in VideoFormat::ALL {
            let mut entry = default_format_entry(format);
            if let Some(file_entry) = formats_file.entry(format) {
                entry.merge(file_entry);
            }
            formats.push(resolve_format(format, &entry, overrides)?);
        }

        let soundbites = file
            .soundbites
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, raw)| resolve_soundbite(index + 1, raw))
            .collect::<CollabResult<Vec<_>>>()?;

        let header_text = overrides
            .header_text
            .clone()
            .or(file.header_text)
            .unwrap_or_else(|| DEFAULT_HEADER_TEXT.to_owned());

        let mut podcast = file.podcast.unwrap_or_default();
        if overrides.podcast_title.is_some() {
            podcast.title.clone_from(&overrides.podcast_title);
        }
        if overrides.episode_title.is_some() {
            podcast.episode_title.clone_from(&overrides.episode_title);
        }
        if overrides.logo.is_some() {
            podcast.logo.clone_from(&overrides.logo);
        }
        if overrides.transcript.is_some() {
            podcast.transcript.clone_from(&overrides.transcript);
        }

        Ok(Self {
            output_dir: overrides
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            fps,
            colors,
            formats,
            fonts: file.fonts.unwrap_or_default(),
            header_text: (!header_text.trim().is_empty()).then_some(header_text),
            call_to_action: overrides
                .call_to_action
                .clone()
                .or(file.call_to_action)
                .filter(|cta| !cta.trim().is_empty()),
            show_subtitles: overrides
                .show_subtitles
                .or(file.show_subtitles)
                .unwrap_or(true),
            progress_bar: overrides.progress_bar.or(file.progress_bar).unwrap_or(false),
            hashtags: file.hashtags.unwrap_or_default(),
            soundbites,
            podcast,
        })
    }

    pub fn enabled_formats(&self) -> impl Iterator<Item = &FormatSettings> {
        self.formats.iter().filter(|settings| settings.enabled)
    }

    pub fn format(&self, format: VideoFormat) -> Option<&FormatSettings> {
        self.formats.iter().find(|settings| settings.spec.format == format)
    }
}

fn default_format_entry(format: VideoFormat) -> FormatFile {
    let (width, height) = format.dimensions_px();
    FormatFile {
        width: Some(width),
        height: Some(height),
        enabled: Some(true),
        description: Some(format.description().to_owned()),
        safe_area: None,
        debug_safe_area: Some(false),
    }
}

fn resolve_format(
    format: VideoFormat,
    entry: &FormatFile,
    overrides: &ConfigOverrides,
) -> CollabResult<FormatSettings> {
    let (default_width, default_height) = format.dimensions_px();
    let mut spec = FormatSpec::new(
        format,
        entry.width.unwrap_or(default_width),
        entry.height.unwrap_or(default_height),
    )?;
    if let Some(insets) = entry.safe_area {
        spec = spec.with_safe_area(insets)?;
    }
    let debug_safe_area = overrides
        .debug_safe_area
        .or(entry.debug_safe_area)
        .unwrap_or(false);
    spec = spec.with_debug_safe_area(debug_safe_area);

    let enabled = match &overrides.formats {
        Some(selected) => selected.contains(&format),
        None => entry.enabled.unwrap_or(true),
    };

    Ok(FormatSettings {
        spec,
        enabled,
        description: entry
            .description
            .clone()
            .unwrap_or_else(|| format.description().to_owned()),
    })
}

fn resolve_soundbite(number: usize, raw: SoundbiteFile) -> CollabResult<Soundbite> {
    let start = raw.start.seconds()?;
    let duration = raw.duration.seconds()?;
    if !start.is_finite() || start < 0.0 {
        return Err(CollaboratorError::config(format!(
            "soundbite {number}: start must be >= 0, got {start}"
        )));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CollaboratorError::config(format!(
            "soundbite {number}: duration must be > 0, got {duration}"
        )));
    }
    Ok(Soundbite {
        start,
        duration,
        title: raw.title,
        text: raw.text,
    })
}
