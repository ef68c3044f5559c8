//! Render orchestration: collaborators in, one encoded video (or still) out.
//!
//! Frames are computed in parallel chunks on a rayon pool and handed to the
//! encoder strictly in increasing index order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::audio::{decode_segment, ANALYSIS_SAMPLE_RATE};
use crate::composer::{frame_time, FrameComposer, PaintReport, StaticInputs, DEFAULT_HEADER_TEXT};
use crate::encoding::{AudioTrack, EncodeSettings, FfmpegPipe};
use crate::format::FormatSpec;
use crate::layout::strategy_for;
use crate::logo::LogoImage;
use crate::raster::canvas::RgbFrame;
use crate::subtitles::TranscriptChunk;
use crate::text::face::FontSet;
use crate::theme::ColorTheme;
use crate::waveform::{sample, WaveformTrack};

/// Frames rendered per parallel batch before they are flushed to the encoder.
pub const DEFAULT_CHUNK_SIZE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderThreading {
    pub chunk_size: usize,
    /// Worker count; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: usize,
    pub chunks: usize,
}

/// One soundbite rendered in one format.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub spec: FormatSpec,
    pub fps: u32,
    /// Episode audio; required for video output.
    pub audio: Option<PathBuf>,
    /// Soundbite window in episode time.
    pub start: f64,
    pub duration: f64,
    pub theme: ColorTheme,
    pub fonts: FontSet,
    pub logo: Option<PathBuf>,
    pub podcast_title: String,
    pub episode_title: String,
    pub header_text: Option<String>,
    pub call_to_action: Option<String>,
    /// Already clip-relative.
    pub chunks: Vec<TranscriptChunk>,
    pub show_subtitles: bool,
    pub progress_bar: bool,
    pub threading: RenderThreading,
    pub ffmpeg_binary: PathBuf,
}

impl RenderJob {
    pub fn new(spec: FormatSpec, fps: u32, start: f64, duration: f64) -> Self {
        Self {
            spec,
            fps,
            audio: None,
            start,
            duration,
            theme: ColorTheme::default(),
            fonts: FontSet::builtin(),
            logo: None,
            podcast_title: String::new(),
            episode_title: String::new(),
            header_text: Some(DEFAULT_HEADER_TEXT.to_owned()),
            call_to_action: None,
            chunks: Vec::new(),
            show_subtitles: true,
            progress_bar: false,
            threading: RenderThreading::default(),
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Number of video frames: `floor(duration * fps)`, at least one.
    pub fn frame_count(&self) -> usize {
        total_frame_count(self.duration, self.fps)
    }
}

pub fn total_frame_count(duration: f64, fps: u32) -> usize {
    if !duration.is_finite() || duration <= 0.0 {
        return 1;
    }
    ((duration * f64::from(fps)).floor() as usize).max(1)
}

/// Decode the soundbite window and reduce it to one amplitude per frame.
pub fn load_waveform(job: &RenderJob) -> Result<WaveformTrack> {
    let audio = job
        .audio
        .as_deref()
        .ok_or_else(|| anyhow!("no audio file given for the soundbite"))?;
    let pcm = decode_segment(audio, job.start, job.duration, ANALYSIS_SAMPLE_RATE)
        .with_context(|| format!("failed to decode audio from {}", audio.display()))?;
    let track = sample(&pcm.samples, pcm.sample_rate, job.fps);
    debug!(frames = track.len(), "sampled waveform");
    Ok(track)
}

/// Static inputs for `job`, with the logo scaled once to its layout size.
pub fn build_inputs(job: &RenderJob, waveform: WaveformTrack) -> StaticInputs {
    let layout = strategy_for(job.spec.format);
    let logo_size = layout.logo_size(&job.spec);

    let mut inputs = StaticInputs::new(job.spec, job.fonts.clone());
    inputs.theme = job.theme;
    inputs.logo = LogoImage::load_optional(job.logo.as_deref(), logo_size);
    inputs.podcast_title.clone_from(&job.podcast_title);
    inputs.episode_title.clone_from(&job.episode_title);
    inputs.header_text.clone_from(&job.header_text);
    inputs.call_to_action.clone_from(&job.call_to_action);
    inputs.waveform = waveform;
    inputs.chunks.clone_from(&job.chunks);
    inputs.duration = job.duration;
    inputs.show_subtitles = job.show_subtitles;
    inputs.progress_bar = job.progress_bar;
    inputs
}

/// Render `total` frames and pass them to `sink` in increasing index order.
pub fn render_frames<F>(
    composer: &FrameComposer,
    total: usize,
    fps: u32,
    threading: &RenderThreading,
    mut sink: F,
) -> Result<RenderStats>
where
    F: FnMut(usize, RgbFrame) -> Result<()>,
{
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threading.threads {
        builder = builder.num_threads(threads.max(1));
    }
    let pool = builder
        .build()
        .context("failed to build render thread pool")?;

    let chunk_size = threading.chunk_size.max(1);
    let report_every = fps.max(1) as usize;
    let mut stats = RenderStats {
        frames_total: total,
        chunks: 0,
    };

    let mut chunk_start = 0usize;
    while chunk_start < total {
        let chunk_end = (chunk_start + chunk_size).min(total);
        let frames: Vec<RgbFrame> = pool.install(|| {
            (chunk_start..chunk_end)
                .into_par_iter()
                .map(|index| composer.render(frame_time(index, fps)))
                .collect()
        });

        for (offset, frame) in frames.into_iter().enumerate() {
            let index = chunk_start + offset;
            sink(index, frame)?;
            let done = index + 1;
            if done % report_every == 0 || done == total {
                info!(
                    frame = done,
                    total,
                    seconds = frame_time(done, fps),
                    "rendered frames"
                );
            }
        }
        stats.chunks += 1;
        chunk_start = chunk_end;
    }

    Ok(stats)
}

/// Decode, sample, compose and encode one soundbite to `output`.
pub fn render_soundbite(job: &RenderJob, output: &Path) -> Result<RenderStats> {
    let started = Instant::now();
    let audio = job
        .audio
        .clone()
        .ok_or_else(|| anyhow!("video output needs an audio file"))?;
    ensure_parent_dir(output)?;

    let waveform = load_waveform(job)?;
    let composer = FrameComposer::new(build_inputs(job, waveform));
    let total = job.frame_count();

    info!(
        format = job.spec.format.keyword(),
        width = job.spec.width,
        height = job.spec.height,
        fps = job.fps,
        frames = total,
        output = %output.display(),
        "rendering soundbite"
    );

    let mut settings = EncodeSettings::new(job.spec.width, job.spec.height, job.fps).with_audio(
        AudioTrack {
            path: audio,
            start: job.start,
            duration: job.duration,
        },
    );
    settings.ffmpeg_binary.clone_from(&job.ffmpeg_binary);

    let mut encoder = FfmpegPipe::spawn(&settings, output)
        .with_context(|| format!("failed to start encoder for {}", output.display()))?;

    let rendered = render_frames(&composer, total, job.fps, &job.threading, |index, frame| {
        encoder
            .write_frame(frame)
            .with_context(|| format!("failed to encode frame {index}"))
    });

    // The encoder's own failure explains a broken pipe better than the write error.
    let finished = encoder
        .finish()
        .with_context(|| format!("ffmpeg failed for {}", output.display()));
    let stats = match (rendered, finished) {
        (Ok(stats), Ok(())) => stats,
        (_, Err(error)) => return Err(error),
        (Err(error), Ok(())) => return Err(error),
    };

    info!(
        output = %output.display(),
        frames = stats.frames_total,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "soundbite rendered"
    );
    Ok(stats)
}

/// Render the frame at clip time `t` to a PNG.
pub fn render_still(inputs: StaticInputs, t: f64, output: &Path) -> Result<PaintReport> {
    ensure_parent_dir(output)?;
    let composer = FrameComposer::new(inputs);
    let (frame, report) = composer.render_with_report(t);
    if report.text_overflowed {
        warn!(t, "text did not fit its budget; rendered best-effort");
    }
    let image = frame
        .to_image()
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", frame.width, frame.height))?;
    image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), t, "still written");
    Ok(report)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
