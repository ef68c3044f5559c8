//! Frame composition: static per-job inputs plus a time `t` in, one RGB
//! frame out. Rendering never fails; every degradation is local to the
//! element it affects.

use std::path::Path;

use tracing::warn;

use crate::format::{FormatSpec, PixelRect, VideoFormat};
use crate::layout::{strategy_for, LayoutStrategy};
use crate::logo::LogoImage;
use crate::raster::canvas::{Canvas, RgbFrame};
use crate::subtitles::TranscriptChunk;
use crate::text::face::FontSet;
use crate::theme::{ColorTheme, ThemeConfig};
use crate::waveform::WaveformTrack;

pub const DEFAULT_HEADER_TEXT: &str = "ASCOLTA";

/// Everything a frame depends on except the time. Built once per render
/// job and shared read-only by all frame computations.
#[derive(Debug, Clone)]
pub struct StaticInputs {
    pub spec: FormatSpec,
    pub theme: ColorTheme,
    pub fonts: FontSet,
    /// Already scaled to its on-frame size.
    pub logo: Option<LogoImage>,
    pub podcast_title: String,
    pub episode_title: String,
    pub header_text: Option<String>,
    pub call_to_action: Option<String>,
    pub waveform: WaveformTrack,
    pub chunks: Vec<TranscriptChunk>,
    pub duration: f64,
    pub show_subtitles: bool,
    pub progress_bar: bool,
}

impl StaticInputs {
    pub fn new(spec: FormatSpec, fonts: FontSet) -> Self {
        Self {
            spec,
            theme: ColorTheme::default(),
            fonts,
            logo: None,
            podcast_title: String::new(),
            episode_title: String::new(),
            header_text: Some(DEFAULT_HEADER_TEXT.to_owned()),
            call_to_action: None,
            waveform: WaveformTrack::default(),
            chunks: Vec::new(),
            duration: 0.0,
            show_subtitles: true,
            progress_bar: false,
        }
    }
}

/// What a layout actually drew, in frame coordinates. Used by tests and by
/// `still` output for visual QA.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaintReport {
    pub header_text: Option<PixelRect>,
    /// Filled share of the progress bar, when drawn.
    pub progress: Option<f32>,
    pub bar_count: usize,
    pub logo: Option<PixelRect>,
    pub title: Option<PixelRect>,
    pub episode_lines: Vec<String>,
    pub cta: Option<PixelRect>,
    pub subtitle_lines: Vec<String>,
    pub subtitle_boxes: Vec<PixelRect>,
    /// Some text block did not fit its budget even at its smallest size.
    pub text_overflowed: bool,
}

pub struct FrameComposer {
    inputs: StaticInputs,
    layout: &'static dyn LayoutStrategy,
}

impl FrameComposer {
    pub fn new(inputs: StaticInputs) -> Self {
        let layout = strategy_for(inputs.spec.format);
        Self { inputs, layout }
    }

    pub fn inputs(&self) -> &StaticInputs {
        &self.inputs
    }

    pub fn layout(&self) -> &'static dyn LayoutStrategy {
        self.layout
    }

    pub fn render(&self, t: f64) -> RgbFrame {
        self.render_with_report(t).0
    }

    pub fn render_with_report(&self, t: f64) -> (RgbFrame, PaintReport) {
        let spec = &self.inputs.spec;
        // The canvas is the only alpha-capable stage; it is demoted to RGB here.
        let Some(mut canvas) = Canvas::new(spec.width, spec.height, self.inputs.theme.background)
        else {
            warn!(
                width = spec.width,
                height = spec.height,
                "cannot allocate canvas, emitting blank frame"
            );
            return (blank_frame(spec, &self.inputs.theme), PaintReport::default());
        };
        let report = self.layout.paint(&mut canvas, &self.inputs, t);
        (canvas.into_rgb(), report)
    }

    /// Frame `index` of a video at `fps`.
    pub fn render_index(&self, index: usize, fps: u32) -> RgbFrame {
        self.render(frame_time(index, fps))
    }
}

pub fn frame_time(index: usize, fps: u32) -> f64 {
    if fps == 0 {
        return 0.0;
    }
    index as f64 / f64::from(fps)
}

fn blank_frame(spec: &FormatSpec, theme: &ColorTheme) -> RgbFrame {
    let pixels = spec.width as usize * spec.height as usize;
    let bg = theme.background;
    RgbFrame {
        width: spec.width,
        height: spec.height,
        data: [bg.r, bg.g, bg.b].repeat(pixels),
    }
}

/// Arguments of a single stand-alone frame render.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub logo_path: Option<&'a Path>,
    pub podcast_title: &'a str,
    pub episode_title: &'a str,
    pub waveform: &'a WaveformTrack,
    pub t: f64,
    pub chunks: &'a [TranscriptChunk],
    pub duration: f64,
    pub theme: Option<&'a ThemeConfig>,
    /// Format keyword; unknown names render vertical.
    pub format: &'a str,
    pub fonts: &'a FontSet,
}

/// Render one frame from loose arguments: resolves the theme, the format
/// (falling back to vertical) and the logo, then paints at `request.t`.
///
/// Batch rendering should build a [`FrameComposer`] once instead.
pub fn render_frame(request: &FrameRequest<'_>) -> RgbFrame {
    let format = VideoFormat::from_keyword_or_default(request.format);
    let spec = FormatSpec::new(format, request.width, request.height)
        .unwrap_or_else(|error| {
            warn!(%error, "using preset frame size");
            FormatSpec::preset(format)
        });
    let layout = strategy_for(format);

    let mut inputs = StaticInputs::new(spec, request.fonts.clone());
    inputs.theme = ColorTheme::resolve(request.theme);
    inputs.logo = LogoImage::load_optional(request.logo_path, layout.logo_size(&spec));
    inputs.podcast_title = request.podcast_title.to_owned();
    inputs.episode_title = request.episode_title.to_owned();
    inputs.waveform = request.waveform.clone();
    inputs.chunks = request.chunks.to_vec();
    inputs.duration = request.duration;

    FrameComposer::new(inputs).render(request.t)
}
