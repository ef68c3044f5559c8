//! Per-format frame layouts.
//!
//! The three formats share one painting skeleton ([`skeleton::paint`]); a
//! strategy only contributes its numeric profile and how far a configured
//! safe area reaches.

pub mod equalizer;
pub mod geometry;
pub mod skeleton;

use crate::composer::{PaintReport, StaticInputs};
use crate::format::{FormatSpec, VideoFormat};
use crate::raster::canvas::Canvas;

pub use geometry::{LayoutGeometry, LayoutProfile, SafeAreaScope};

pub trait LayoutStrategy: Send + Sync {
    fn format(&self) -> VideoFormat;

    fn profile(&self) -> LayoutProfile;

    fn safe_area_scope(&self) -> SafeAreaScope;

    fn geometry(&self, spec: &FormatSpec) -> LayoutGeometry {
        LayoutGeometry::new(spec.width, spec.height, &self.profile())
    }

    /// Logo edge in pixels, narrowed to the safe width when the safe area
    /// governs the whole frame.
    fn logo_size(&self, spec: &FormatSpec) -> u32 {
        let size = self.geometry(spec).logo_size;
        match self.safe_area_scope() {
            SafeAreaScope::Everything if spec.has_safe_area() => {
                let safe = spec.safe_rect();
                size.min(safe.width().min(safe.height()).max(0.0) as u32)
            }
            _ => size,
        }
    }

    fn paint(&self, canvas: &mut Canvas, inputs: &StaticInputs, t: f64) -> PaintReport {
        skeleton::paint(&self.profile(), self.safe_area_scope(), canvas, inputs, t)
    }
}

/// 9:16. A configured safe area constrains every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalLayout;

/// 1:1. Safe area applies to subtitles only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareLayout;

/// 16:9. Safe area applies to subtitles only.
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalLayout;

impl LayoutStrategy for VerticalLayout {
    fn format(&self) -> VideoFormat {
        VideoFormat::Vertical
    }

    fn profile(&self) -> LayoutProfile {
        LayoutProfile {
            header_fraction: 0.12,
            central_fraction: 0.58,
            bar_width: 12,
            bar_spacing: 3,
            bar_center_fraction: 0.55,
            logo_ratio: 0.55,
            logo_center_fraction: 0.40,
            subtitle_font_fraction: 0.03,
            subtitle_max_lines: 3,
        }
    }

    fn safe_area_scope(&self) -> SafeAreaScope {
        SafeAreaScope::Everything
    }
}

impl LayoutStrategy for SquareLayout {
    fn format(&self) -> VideoFormat {
        VideoFormat::Square
    }

    fn profile(&self) -> LayoutProfile {
        LayoutProfile {
            header_fraction: 0.15,
            central_fraction: 0.60,
            bar_width: 12,
            bar_spacing: 3,
            bar_center_fraction: 0.50,
            logo_ratio: 0.40,
            logo_center_fraction: 0.42,
            subtitle_font_fraction: 0.04,
            subtitle_max_lines: 2,
        }
    }

    fn safe_area_scope(&self) -> SafeAreaScope {
        SafeAreaScope::SubtitlesOnly
    }
}

impl LayoutStrategy for HorizontalLayout {
    fn format(&self) -> VideoFormat {
        VideoFormat::Horizontal
    }

    fn profile(&self) -> LayoutProfile {
        LayoutProfile {
            header_fraction: 0.13,
            central_fraction: 0.62,
            bar_width: 14,
            bar_spacing: 4,
            bar_center_fraction: 0.50,
            logo_ratio: 0.45,
            logo_center_fraction: 0.42,
            subtitle_font_fraction: 0.045,
            subtitle_max_lines: 2,
        }
    }

    fn safe_area_scope(&self) -> SafeAreaScope {
        SafeAreaScope::SubtitlesOnly
    }
}

static VERTICAL: VerticalLayout = VerticalLayout;
static SQUARE: SquareLayout = SquareLayout;
static HORIZONTAL: HorizontalLayout = HorizontalLayout;

pub fn strategy_for(format: VideoFormat) -> &'static dyn LayoutStrategy {
    match format {
        VideoFormat::Vertical => &VERTICAL,
        VideoFormat::Square => &SQUARE,
        VideoFormat::Horizontal => &HORIZONTAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_format() {
        for format in VideoFormat::ALL {
            assert_eq!(strategy_for(format).format(), format);
        }
    }

    #[test]
    fn only_vertical_applies_safe_area_everywhere() {
        assert_eq!(
            strategy_for(VideoFormat::Vertical).safe_area_scope(),
            SafeAreaScope::Everything
        );
        assert_eq!(
            strategy_for(VideoFormat::Square).safe_area_scope(),
            SafeAreaScope::SubtitlesOnly
        );
        assert_eq!(
            strategy_for(VideoFormat::Horizontal).safe_area_scope(),
            SafeAreaScope::SubtitlesOnly
        );
    }

    #[test]
    fn vertical_logo_shrinks_to_safe_width() {
        let spec = FormatSpec::preset(VideoFormat::Vertical)
            .with_safe_area(crate::format::SafeInsetsPx {
                left: 300,
                right: 300,
                top: 0,
                bottom: 0,
            })
            .unwrap();
        let layout = strategy_for(VideoFormat::Vertical);
        assert_eq!(layout.logo_size(&FormatSpec::preset(VideoFormat::Vertical)), 594);
        assert_eq!(layout.logo_size(&spec), 480);
    }
}
