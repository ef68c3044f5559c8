use crate::format::PixelRect;

/// Whether a configured safe area constrains the whole frame or only the
/// subtitle block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeAreaScope {
    Everything,
    SubtitlesOnly,
}

/// Per-format numeric constants. Everything else in a layout is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutProfile {
    pub header_fraction: f32,
    pub central_fraction: f32,
    pub bar_width: u32,
    pub bar_spacing: u32,
    /// Vertical centre of the bars inside the central band, 0 = top.
    pub bar_center_fraction: f32,
    /// Logo edge as a fraction of `min(width, central_height)`.
    pub logo_ratio: f32,
    pub logo_center_fraction: f32,
    /// Subtitle font size as a fraction of the frame height.
    pub subtitle_font_fraction: f32,
    pub subtitle_max_lines: usize,
}

/// Band heights and anchor points for one frame size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutGeometry {
    pub width: f32,
    pub height: f32,
    pub header_height: f32,
    pub central_top: f32,
    pub central_height: f32,
    pub footer_top: f32,
    pub footer_height: f32,
    pub logo_size: u32,
    pub logo_center_y: f32,
    pub bar_center_y: f32,
}

impl LayoutGeometry {
    pub fn new(width: u32, height: u32, profile: &LayoutProfile) -> Self {
        let w = width as f32;
        let h = height as f32;
        let header_height = (h * profile.header_fraction).floor();
        let central_top = header_height;
        let central_height = (h * profile.central_fraction).floor();
        let footer_top = (central_top + central_height).min(h);
        let footer_height = h - footer_top;
        let logo_size = (w.min(central_height) * profile.logo_ratio).floor().max(0.0) as u32;

        Self {
            width: w,
            height: h,
            header_height,
            central_top,
            central_height,
            footer_top,
            footer_height,
            logo_size,
            logo_center_y: central_top + (central_height * profile.logo_center_fraction).floor(),
            bar_center_y: central_top + (central_height * profile.bar_center_fraction).floor(),
        }
    }

    pub fn central_bottom(&self) -> f32 {
        self.central_top + self.central_height
    }

    pub fn header_rect(&self) -> PixelRect {
        PixelRect::from_xywh(0.0, 0.0, self.width, self.header_height)
    }

    pub fn footer_rect(&self) -> PixelRect {
        PixelRect::from_xywh(0.0, self.footer_top, self.width, self.footer_height)
    }

    /// Square of `size` centred horizontally on the frame and vertically on
    /// the logo anchor.
    pub fn logo_rect(&self, size: u32) -> PixelRect {
        let size = size as f32;
        PixelRect::from_xywh(
            ((self.width - size) / 2.0).floor(),
            (self.logo_center_y - size / 2.0).floor(),
            size,
            size,
        )
    }
}
