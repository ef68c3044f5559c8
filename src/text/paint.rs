use crate::raster::canvas::Canvas;
use crate::text::face::Face;
use crate::theme::Rgba;

/// Draw a single line with its baseline at `baseline_y`, starting at `x`.
pub fn draw_text(
    canvas: &mut Canvas,
    face: &dyn Face,
    text: &str,
    px: f32,
    x: f32,
    baseline_y: f32,
    color: Rgba,
) {
    let mut pen_x = x;
    let baseline = baseline_y.round() as i32;
    for ch in text.chars() {
        let glyph = face.rasterize(ch, px);
        if glyph.width > 0 && glyph.height > 0 {
            let gx = pen_x.round() as i32 + glyph.xmin;
            // Bitmap rows run top-down; ymin is the bottom edge above baseline.
            let gy = baseline - glyph.ymin - glyph.height as i32;
            canvas.blend_coverage(gx, gy, glyph.width, glyph.height, &glyph.coverage, color);
        }
        pen_x += face.advance(ch, px);
    }
}

/// Draw a line whose line box starts at `top_y`.
pub fn draw_text_top(
    canvas: &mut Canvas,
    face: &dyn Face,
    text: &str,
    px: f32,
    x: f32,
    top_y: f32,
    color: Rgba,
) {
    let ascent = face.line_metrics(px).ascent;
    draw_text(canvas, face, text, px, x, top_y + ascent, color);
}

/// Draw a line horizontally centred on `center_x`.
pub fn draw_text_centered(
    canvas: &mut Canvas,
    face: &dyn Face,
    text: &str,
    px: f32,
    center_x: f32,
    top_y: f32,
    color: Rgba,
) {
    let x = center_x - face.measure(text, px) / 2.0;
    draw_text_top(canvas, face, text, px, x, top_y, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::face::BlockFace;
    use crate::theme::{Rgb, COLOR_BEIGE, COLOR_WHITE};

    #[test]
    fn block_glyph_lands_above_baseline() {
        let mut canvas = Canvas::new(40, 40, COLOR_BEIGE).unwrap();
        // 20px: block is 8x14 at x+1, bottom edge on the baseline.
        draw_text(&mut canvas, &BlockFace, "x", 20.0, 10.0, 30.0, COLOR_WHITE.opaque());
        let frame = canvas.into_rgb();
        assert_eq!(frame.pixel(12, 25), Some(COLOR_WHITE));
        assert_eq!(frame.pixel(12, 16), Some(COLOR_WHITE));
        assert_eq!(frame.pixel(12, 30), Some(COLOR_BEIGE));
        assert_eq!(frame.pixel(12, 15), Some(COLOR_BEIGE));
    }

    #[test]
    fn spaces_draw_nothing() {
        let mut canvas = Canvas::new(20, 20, Rgb::new(0, 0, 0)).unwrap();
        draw_text_top(&mut canvas, &BlockFace, "   ", 10.0, 0.0, 0.0, COLOR_WHITE.opaque());
        assert!(canvas.into_rgb().data.iter().all(|&b| b == 0));
    }
}
