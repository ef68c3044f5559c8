//! Rounded, optionally shadowed boxes behind text: subtitle cards and the
//! call-to-action pill.

use crate::format::PixelRect;
use crate::raster::blur::gaussian_blur;
use crate::raster::canvas::Canvas;
use crate::text::face::Face;
use crate::text::layout::TextBlock;
use crate::text::paint::draw_text_top;
use crate::theme::{Rgba, COLOR_BLACK, COLOR_WHITE};

/// Soft drop shadow: an offset, blurred copy of the badge shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur_radius: u32,
    pub color: Rgba,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 4.0,
            blur_radius: 8,
            color: Rgba::new(0, 0, 0, 90),
        }
    }
}

impl Shadow {
    /// `bounds` shrunk so a badge placed inside it keeps its shadow inside
    /// `bounds` too. Collapses to a zero-size rect when nothing fits.
    pub fn inner_bounds(&self, bounds: PixelRect) -> PixelRect {
        let blur = self.blur_radius as f32;
        let left = bounds.left + (blur - self.offset_x).max(0.0).ceil();
        let right = bounds.right - (blur + self.offset_x).max(0.0).ceil();
        let top = bounds.top + (blur - self.offset_y).max(0.0).ceil();
        let bottom = bounds.bottom - (blur + self.offset_y).max(0.0).ceil();
        let (left, right) = if left <= right {
            (left, right)
        } else {
            let mid = bounds.center_x().round();
            (mid, mid)
        };
        let (top, bottom) = if top <= bottom {
            (top, bottom)
        } else {
            let mid = ((bounds.top + bounds.bottom) / 2.0).round();
            (mid, mid)
        };
        PixelRect {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Area a shadowed badge may occupy so that nothing it paints leaves
/// `bounds`. Text meant for a badge should be fitted against this width.
pub fn badge_bounds(bounds: PixelRect) -> PixelRect {
    Shadow::default().inner_bounds(bounds)
}

/// Corner radius relative to the line height of the text inside.
const SUBTITLE_RADIUS_RATIO: f32 = 0.25;

/// Paint a rounded box (and its shadow) onto `canvas`.
///
/// The box is drawn into a transparent layer first so the shadow blur never
/// touches frame pixels, then composited source-over.
pub fn draw_badge(
    canvas: &mut Canvas,
    rect: PixelRect,
    fill: Rgba,
    radius: f32,
    shadow: Option<&Shadow>,
) {
    let left = rect.left.round();
    let top = rect.top.round();
    let width = rect.width().round();
    let height = rect.height().round();
    if width < 1.0 || height < 1.0 {
        return;
    }

    let margin = shadow
        .map(|s| s.blur_radius as f32 + s.offset_x.abs().max(s.offset_y.abs()))
        .unwrap_or(0.0)
        .ceil();
    let layer_w = (width + 2.0 * margin) as u32;
    let layer_h = (height + 2.0 * margin) as u32;
    let Some(mut layer) = Canvas::transparent(layer_w, layer_h) else {
        return;
    };

    if let Some(shadow) = shadow {
        let shadow_rect = PixelRect::from_xywh(
            margin + shadow.offset_x,
            margin + shadow.offset_y,
            width,
            height,
        );
        layer.fill_rounded_rect(shadow_rect, radius, shadow.color);
        gaussian_blur(layer.pixmap_mut(), shadow.blur_radius);
    }
    layer.fill_rounded_rect(PixelRect::from_xywh(margin, margin, width, height), radius, fill);

    canvas.draw_layer(
        (left - margin) as i32,
        (top - margin) as i32,
        layer.pixmap().as_ref(),
    );
}

/// Draw one card per line, each centred horizontally within `bounds` and
/// stacked from `top`. The stack is kept inside `bounds` shadows included,
/// moving up when it would run past the bottom. Returns the card rectangles
/// in frame coordinates.
pub fn render_subtitle_lines(
    canvas: &mut Canvas,
    face: &dyn Face,
    block: &TextBlock,
    bounds: PixelRect,
    top: f32,
    text_color: Rgba,
    background: Rgba,
) -> Vec<PixelRect> {
    let pad_x = block.pad_x();
    let pad_y = block.pad_y();
    let box_height = block.line_box_height();
    let radius = block.line_height() * SUBTITLE_RADIUS_RATIO;
    let shadow = Shadow::default();
    let inner = shadow.inner_bounds(bounds);

    let stack_height = match block.lines.len() {
        0 => 0.0,
        n => (n - 1) as f32 * block.pitch() + box_height,
    };
    let top = top.min(inner.bottom - stack_height).max(inner.top);

    let mut boxes = Vec::with_capacity(block.lines.len());
    for (index, line) in block.lines.iter().enumerate() {
        let text_width = face.measure(line, block.px);
        let box_width = (text_width + 2.0 * pad_x).min(inner.width()).floor();
        let x = (inner.center_x() - box_width / 2.0)
            .max(inner.left)
            .min(inner.right - box_width)
            .round();
        let y = (top + index as f32 * block.pitch()).round();
        let card = PixelRect::from_xywh(x, y, box_width, box_height);

        draw_badge(canvas, card, background, radius, Some(&shadow));
        let text_x = card.center_x() - text_width / 2.0;
        draw_text_top(canvas, face, line, block.px, text_x, y + pad_y, text_color);
        boxes.push(card);
    }
    boxes
}

/// White rounded pill with dark text centred on `center_x`, kept inside
/// `bounds` together with its shadow. `None` when there is nothing to draw.
pub fn render_pill(
    canvas: &mut Canvas,
    face: &dyn Face,
    block: &TextBlock,
    center_x: f32,
    top: f32,
    bounds: PixelRect,
) -> Option<PixelRect> {
    if block.lines.is_empty() {
        return None;
    }
    let pad_x = block.pad_x();
    let pad_y = block.pad_y();
    let shadow = Shadow::default();
    let inner = shadow.inner_bounds(bounds);
    let width = (block.widest_line(face) + 2.0 * pad_x)
        .min(inner.width())
        .floor();
    let height = block.outer_height().round();

    let x = (center_x - width / 2.0)
        .min(inner.right - width)
        .max(inner.left)
        .round();
    let y = top.min(inner.bottom - height).max(inner.top).round();
    let pill = PixelRect::from_xywh(x, y, width, height);

    let radius = (height / 2.0).min(block.line_height());
    draw_badge(canvas, pill, COLOR_WHITE.opaque(), radius, Some(&shadow));

    let text_color = COLOR_BLACK.opaque();
    for (index, line) in block.lines.iter().enumerate() {
        let line_width = face.measure(line, block.px);
        let line_top = y + pad_y + index as f32 * block.pitch();
        draw_text_top(
            canvas,
            face,
            line,
            block.px,
            pill.center_x() - line_width / 2.0,
            line_top,
            text_color,
        );
    }
    Some(pill)
}
