use image::{ImageBuffer, Rgb as ImageRgb, RgbImage};
use tiny_skia::{
    FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PixmapRef, Rect, Stroke, Transform,
};

use crate::format::PixelRect;
use crate::theme::{Rgb, Rgba};

/// Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Premultiplied RGBA drawing surface for one frame.
///
/// Everything is composited with alpha here; the frame is only demoted to
/// opaque RGB at the very end by [`Canvas::into_rgb`].
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// `None` for a zero-sized or absurdly large frame.
    pub fn new(width: u32, height: u32, background: Rgb) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        pixmap.fill(background.opaque().to_skia());
        Some(Self { pixmap })
    }

    /// Fully transparent surface, used for off-screen layers.
    pub fn transparent(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        let Some(rect) = to_skia_rect(rect) else {
            return;
        };
        self.pixmap
            .fill_rect(rect, &solid_paint(color), Transform::identity(), None);
    }

    pub fn fill_rounded_rect(&mut self, rect: PixelRect, radius: f32, color: Rgba) {
        let radius = radius
            .min(rect.width() / 2.0)
            .min(rect.height() / 2.0)
            .max(0.0);
        if radius <= 0.0 {
            self.fill_rect(rect, color);
            return;
        }
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    pub fn stroke_rect(&mut self, rect: PixelRect, line_width: f32, color: Rgba) {
        let Some(skia_rect) = to_skia_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(skia_rect);
        let stroke = Stroke {
            width: line_width.max(1.0),
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &solid_paint(color),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    /// Source-over composite of a premultiplied layer with its top-left at `(x, y)`.
    pub fn draw_layer(&mut self, x: i32, y: i32, layer: PixmapRef<'_>) {
        self.pixmap.draw_pixmap(
            x,
            y,
            layer,
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Blend an 8-bit coverage mask tinted with `color`, clipped to the frame.
    pub fn blend_coverage(
        &mut self,
        x: i32,
        y: i32,
        mask_width: usize,
        mask_height: usize,
        coverage: &[u8],
        color: Rgba,
    ) {
        let frame_width = self.pixmap.width() as i32;
        let frame_height = self.pixmap.height() as i32;
        let data = self.pixmap.data_mut();

        for row in 0..mask_height {
            let py = y + row as i32;
            if py < 0 || py >= frame_height {
                continue;
            }
            for col in 0..mask_width {
                let px = x + col as i32;
                if px < 0 || px >= frame_width {
                    continue;
                }
                let mask = coverage[row * mask_width + col];
                if mask == 0 {
                    continue;
                }
                let alpha = (u16::from(mask) * u16::from(color.a) + 127) / 255;
                let idx = ((py * frame_width + px) as usize) * 4;
                blend_premultiplied(data, idx, [color.r, color.g, color.b], alpha);
            }
        }
    }

    /// Demultiply into a packed RGB24 frame.
    pub fn into_rgb(self) -> RgbFrame {
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue()]);
        }
        RgbFrame {
            width,
            height,
            data,
        }
    }
}

/// `dst = src * a + dst * (1 - a)` on premultiplied bytes.
fn blend_premultiplied(data: &mut [u8], idx: usize, rgb: [u8; 3], alpha: u16) {
    if alpha == 0 {
        return;
    }
    let inv_alpha = 255 - alpha.min(255);
    for (channel, value) in rgb.into_iter().enumerate() {
        let src = u16::from(value) * alpha / 255;
        let dst = u16::from(data[idx + channel]);
        data[idx + channel] = (src + (dst * inv_alpha + 127) / 255).min(255) as u8;
    }
    let dst_a = u16::from(data[idx + 3]);
    data[idx + 3] = (alpha + (dst_a * inv_alpha + 127) / 255).min(255) as u8;
}

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn to_skia_rect(rect: PixelRect) -> Option<Rect> {
    Rect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom)
}

fn rounded_rect_path(rect: PixelRect, radius: f32) -> Option<tiny_skia::Path> {
    let (l, t, r, b) = (rect.left, rect.top, rect.right, rect.bottom);
    let k = radius * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(r - radius, t);
    pb.cubic_to(r - radius + k, t, r, t + radius - k, r, t + radius);
    pb.line_to(r, b - radius);
    pb.cubic_to(r, b - radius + k, r - radius + k, b, r - radius, b);
    pb.line_to(l + radius, b);
    pb.cubic_to(l + radius - k, b, l, b - radius + k, l, b - radius);
    pb.line_to(l, t + radius);
    pb.cubic_to(l, t + radius - k, l + radius - k, t, l + radius, t);
    pb.close();
    pb.finish()
}

/// One finished video frame: packed RGB24, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb::new(
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
        ))
    }

    pub fn to_image(&self) -> Option<RgbImage> {
        ImageBuffer::<ImageRgb<u8>, _>::from_raw(self.width, self.height, self.data.clone())
    }
}
