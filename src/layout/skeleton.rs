//! Painting steps shared by every format: header, equalizer, logo, footer,
//! subtitles, then the optional safe-area outline.

use tracing::debug;

use crate::composer::{PaintReport, StaticInputs};
use crate::format::PixelRect;
use crate::layout::equalizer::{bar_count, bar_heights, sensitivity_pattern};
use crate::layout::geometry::{LayoutGeometry, LayoutProfile, SafeAreaScope};
use crate::raster::badge::{badge_bounds, render_pill, render_subtitle_lines};
use crate::raster::canvas::Canvas;
use crate::subtitles::subtitle_for_time;
use crate::text::face::Face;
use crate::text::layout::{
    fit_block, truncate_with_ellipsis, wrap, BlockFrame, FitPolicy, OverflowPolicy,
};
use crate::text::paint::draw_text_centered;
use crate::theme::Rgba;

const HEADER_TEXT_RATIO: f32 = 0.4;
const PROGRESS_TRACK_ALPHA: u8 = 80;

const TITLE_SIZE_RATIO: f32 = 0.15;
const TITLE_TOP_RATIO: f32 = 0.10;
const EPISODE_SIZE_RATIO: f32 = 0.10;
const EPISODE_OFFSET_RATIO: f32 = 0.20;
const EPISODE_PITCH_RATIO: f32 = 0.12;
const EPISODE_MAX_LINES: usize = 3;
const EPISODE_WIDTH_RATIO: f32 = 0.9;

const CTA_SIZE_RATIO: f32 = 0.09;
const CTA_MIN_PX: f32 = 14.0;
const CTA_MARGIN_RATIO: f32 = 0.04;
const CTA_MAX_LINES: usize = 2;
const CTA_WIDTH_RATIO: f32 = 0.9;
const CTA_FRAME: BlockFrame = BlockFrame {
    pad_x_ratio: 0.6,
    pad_y_ratio: 0.3,
    gap_ratio: 0.15,
    per_line: false,
};

/// Subtitle width when no safe area is configured.
const SUBTITLE_WIDTH_RATIO: f32 = 0.85;
const SUBTITLE_GAP_RATIO: f32 = 0.03;
const SUBTITLE_MIN_SCALE: f32 = 0.6;
const SUBTITLE_FRAME: BlockFrame = BlockFrame {
    pad_x_ratio: 0.4,
    pad_y_ratio: 0.2,
    gap_ratio: 0.15,
    per_line: true,
};

const SHRINK_STEP_PX: f32 = 2.0;

const DEBUG_OUTLINE: Rgba = Rgba::new(255, 0, 0, 160);
const DEBUG_OUTLINE_WIDTH: f32 = 4.0;

pub fn paint(
    profile: &LayoutProfile,
    scope: SafeAreaScope,
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    t: f64,
) -> PaintReport {
    let spec = &inputs.spec;
    let geometry = LayoutGeometry::new(spec.width, spec.height, profile);
    let element_bounds = match scope {
        SafeAreaScope::Everything if spec.has_safe_area() => spec.safe_rect(),
        _ => spec.frame_rect(),
    };

    let mut report = PaintReport::default();
    paint_header(canvas, inputs, &geometry, element_bounds, t, &mut report);
    paint_bars(canvas, inputs, profile, &geometry, element_bounds, t, &mut report);
    paint_logo(canvas, inputs, &geometry, element_bounds, &mut report);
    paint_footer(canvas, inputs, &geometry, element_bounds, &mut report);
    if inputs.show_subtitles {
        paint_subtitles(canvas, inputs, profile, &geometry, t, &mut report);
    }

    if spec.debug_safe_area && spec.has_safe_area() {
        canvas.stroke_rect(spec.safe_rect(), DEBUG_OUTLINE_WIDTH, DEBUG_OUTLINE);
    }
    report
}

/// Shift `rect` (without resizing) so it lies inside `bounds` where possible.
fn clamp_into(rect: PixelRect, bounds: PixelRect) -> PixelRect {
    let left = rect.left.min(bounds.right - rect.width()).max(bounds.left);
    let top = rect.top.min(bounds.bottom - rect.height()).max(bounds.top);
    PixelRect::from_xywh(left, top, rect.width(), rect.height())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

/// Fraction of the clip already played, in `[0, 1]`.
pub fn progress_fraction(t: f64, duration: f64) -> f32 {
    if duration <= 0.0 || !t.is_finite() {
        return 0.0;
    }
    (t / duration).clamp(0.0, 1.0) as f32
}

fn paint_header(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    geometry: &LayoutGeometry,
    bounds: PixelRect,
    t: f64,
    report: &mut PaintReport,
) {
    let theme = &inputs.theme;
    canvas.fill_rect(geometry.header_rect(), theme.primary.opaque());
    if geometry.header_height < 1.0 {
        return;
    }

    if let Some(text) = non_empty(inputs.header_text.as_deref()) {
        let face = &*inputs.fonts.bold;
        let px = (geometry.header_height * HEADER_TEXT_RATIO).floor().max(1.0);
        let line_height = face.line_metrics(px).line_height();
        let text = truncate_with_ellipsis(face, text, px, bounds.width());
        let width = face.measure(&text, px);
        let nominal = PixelRect::from_xywh(
            bounds.center_x() - width / 2.0,
            ((geometry.header_height - line_height) / 2.0).floor(),
            width,
            line_height,
        );
        let rect = clamp_into(nominal, bounds);
        draw_text_centered(
            canvas,
            face,
            &text,
            px,
            rect.center_x(),
            rect.top,
            theme.text.opaque(),
        );
        report.header_text = Some(rect);
    }

    if inputs.progress_bar {
        let track_height = (geometry.header_height * 0.06).round().max(4.0);
        let margin_x = (geometry.width * 0.05).round();
        let left = margin_x.max(bounds.left);
        let right = (geometry.width - margin_x).min(bounds.right);
        if right <= left {
            return;
        }
        let nominal_top = geometry.header_height - track_height - (geometry.header_height * 0.12).round();
        let top = nominal_top.max(bounds.top).min(bounds.bottom - track_height);
        let track = PixelRect {
            left,
            top,
            right,
            bottom: top + track_height,
        };
        let progress = progress_fraction(t, inputs.duration);
        canvas.fill_rect(track, theme.text.with_alpha(PROGRESS_TRACK_ALPHA));
        if progress > 0.0 {
            let filled = PixelRect {
                right: left + (track.width() * progress).round(),
                ..track
            };
            canvas.fill_rect(filled, theme.text.opaque());
        }
        report.progress = Some(progress);
    }
}

fn paint_bars(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    profile: &LayoutProfile,
    geometry: &LayoutGeometry,
    bounds: PixelRect,
    t: f64,
    report: &mut PaintReport,
) {
    let Some(amplitude) = inputs.waveform.amplitude_at(t, inputs.duration) else {
        debug!("empty waveform, skipping equalizer");
        return;
    };
    let count = bar_count(bounds.width(), profile.bar_width, profile.bar_spacing);
    if count == 0 {
        debug!(width = bounds.width(), "too narrow for a symmetric equalizer");
        return;
    }

    let sensitivities = sensitivity_pattern(count);
    let heights = bar_heights(amplitude, &sensitivities, geometry.central_height);
    let pitch = (profile.bar_width + profile.bar_spacing) as f32;
    let bar_width = profile.bar_width as f32;
    let span = count as f32 * pitch - profile.bar_spacing as f32;
    let start_x = bounds.left + ((bounds.width() - span) / 2.0).floor();
    let color = inputs.theme.primary.opaque();

    for (index, &height) in heights.iter().enumerate() {
        let x = start_x + index as f32 * pitch;
        let top = (geometry.bar_center_y - (height / 2) as f32).max(bounds.top);
        let bottom = (top + height as f32).min(bounds.bottom);
        if bottom > top {
            canvas.fill_rect(
                PixelRect {
                    left: x,
                    top,
                    right: x + bar_width,
                    bottom,
                },
                color,
            );
        }
    }
    report.bar_count = count;
}

fn paint_logo(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    geometry: &LayoutGeometry,
    bounds: PixelRect,
    report: &mut PaintReport,
) {
    let Some(logo) = &inputs.logo else {
        return;
    };
    let rect = clamp_into(geometry.logo_rect(logo.size()), bounds);
    canvas.draw_layer(rect.left as i32, rect.top as i32, logo.pixmap().as_ref());
    report.logo = Some(rect);
}

fn paint_footer(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    geometry: &LayoutGeometry,
    bounds: PixelRect,
    report: &mut PaintReport,
) {
    let theme = &inputs.theme;
    canvas.fill_rect(geometry.footer_rect(), theme.primary.opaque());
    let footer_height = geometry.footer_height;
    if footer_height < 1.0 {
        return;
    }
    let text_color = theme.text.opaque();

    let bold = &*inputs.fonts.bold;
    let title_px = (footer_height * TITLE_SIZE_RATIO).floor().max(1.0);
    let title_metrics = bold.line_metrics(title_px);
    let title_top = (geometry.footer_top + (footer_height * TITLE_TOP_RATIO).floor())
        .min(bounds.bottom - title_metrics.line_height())
        .max(bounds.top);
    let title_baseline = title_top + title_metrics.ascent;
    let mut content_bottom = title_top + title_metrics.line_height();

    let title = truncate_with_ellipsis(bold, inputs.podcast_title.trim(), title_px, bounds.width());
    if !inputs.podcast_title.trim().is_empty() {
        let width = bold.measure(&title, title_px);
        draw_text_centered(canvas, bold, &title, title_px, bounds.center_x(), title_top, text_color);
        report.title = Some(PixelRect::from_xywh(
            bounds.center_x() - width / 2.0,
            title_top,
            width,
            title_metrics.line_height(),
        ));
    }

    let regular = &*inputs.fonts.regular;
    let episode_px = (footer_height * EPISODE_SIZE_RATIO).floor().max(1.0);
    let episode_line_height = regular.line_metrics(episode_px).line_height();
    let pitch = (footer_height * EPISODE_PITCH_RATIO).floor().max(episode_line_height);
    let lines = wrap(
        regular,
        &inputs.episode_title,
        episode_px,
        bounds.width() * EPISODE_WIDTH_RATIO,
        Some(EPISODE_MAX_LINES),
    );
    let mut y = title_top + (footer_height * EPISODE_OFFSET_RATIO).floor();
    for line in lines {
        if y + episode_line_height > bounds.bottom {
            break;
        }
        draw_text_centered(canvas, regular, &line, episode_px, bounds.center_x(), y, text_color);
        content_bottom = y + episode_line_height;
        report.episode_lines.push(line);
        y += pitch;
    }

    if let Some(cta) = non_empty(inputs.call_to_action.as_deref()) {
        paint_cta(
            canvas,
            inputs,
            geometry,
            bounds,
            cta,
            content_bottom,
            title_baseline,
            report,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_cta(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    geometry: &LayoutGeometry,
    bounds: PixelRect,
    text: &str,
    content_bottom: f32,
    title_baseline: f32,
    report: &mut PaintReport,
) {
    let face: &dyn Face = &*inputs.fonts.bold;
    let margin = (geometry.footer_height * CTA_MARGIN_RATIO).floor();
    let budget_top = content_bottom + margin;
    let budget_bottom = badge_bounds(bounds).bottom - margin;
    let base_px = (geometry.footer_height * CTA_SIZE_RATIO).floor().max(CTA_MIN_PX);

    let policy = FitPolicy {
        base_px,
        min_px: CTA_MIN_PX,
        step_px: SHRINK_STEP_PX,
        max_width: (bounds.width() * CTA_WIDTH_RATIO).min(badge_bounds(bounds).width()),
        max_height: (budget_bottom - budget_top).max(0.0),
        max_lines: CTA_MAX_LINES,
        overflow: OverflowPolicy::Compress,
        paragraphs: true,
        frame: CTA_FRAME,
    };
    let mut block = fit_block(face, text, &policy);

    // Best effort: anchor an overflowing pill to the bottom of its budget.
    let top = if block.overflowed {
        debug!(px = block.px, "call to action overflows its budget");
        block.truncate_to_height((budget_bottom - title_baseline).max(0.0));
        budget_bottom - block.outer_height()
    } else {
        budget_top
    };
    let top = top.max(title_baseline);

    report.cta = render_pill(canvas, face, &block, bounds.center_x(), top, bounds);
    report.text_overflowed |= block.overflowed;
}

fn paint_subtitles(
    canvas: &mut Canvas,
    inputs: &StaticInputs,
    profile: &LayoutProfile,
    geometry: &LayoutGeometry,
    t: f64,
    report: &mut PaintReport,
) {
    let Some(text) = subtitle_for_time(&inputs.chunks, t) else {
        return;
    };
    let spec = &inputs.spec;

    // Subtitles respect a configured safe area in every format.
    let bounds = if spec.has_safe_area() {
        spec.safe_rect()
    } else {
        let width = (geometry.width * SUBTITLE_WIDTH_RATIO).floor();
        PixelRect::from_xywh(
            ((geometry.width - width) / 2.0).floor(),
            0.0,
            width,
            geometry.height,
        )
    };

    let cards = badge_bounds(bounds);

    let logo_rect = report
        .logo
        .unwrap_or_else(|| geometry.logo_rect(geometry.logo_size));
    let gap = (geometry.central_height * SUBTITLE_GAP_RATIO).floor();
    let top = (logo_rect.bottom + gap).max(cards.top);
    let bottom = (geometry.footer_top - gap).min(cards.bottom);

    let base_px = (geometry.height * profile.subtitle_font_fraction).floor().max(1.0);
    let policy = FitPolicy {
        base_px,
        min_px: (base_px * SUBTITLE_MIN_SCALE).floor().max(1.0),
        step_px: SHRINK_STEP_PX,
        max_width: cards.width(),
        max_height: (bottom - top).max(0.0),
        max_lines: profile.subtitle_max_lines,
        overflow: OverflowPolicy::Drop,
        paragraphs: false,
        frame: SUBTITLE_FRAME,
    };
    let face = &*inputs.fonts.regular;
    let mut block = fit_block(face, &text, &policy);

    let block_top = if block.overflowed {
        block.truncate_to_height((bottom - cards.top).max(0.0));
        (bottom - block.outer_height()).max(cards.top)
    } else {
        top
    };

    report.subtitle_boxes = render_subtitle_lines(
        canvas,
        face,
        &block,
        bounds,
        block_top,
        inputs.theme.text.opaque(),
        inputs.theme.subtitle_background,
    );
    report.text_overflowed |= block.overflowed;
    report.subtitle_lines = block.lines;
}
