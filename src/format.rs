use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CollabResult, CollaboratorError};

/// The three social-media presets an audiogram can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// 9:16 for Reels, Stories, Shorts, TikTok.
    Vertical,
    /// 1:1 for Instagram posts, Mastodon, LinkedIn.
    Square,
    /// 16:9 for YouTube.
    Horizontal,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [Self::Vertical, Self::Square, Self::Horizontal];

    pub fn from_keyword(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vertical" => Some(Self::Vertical),
            "square" => Some(Self::Square),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }

    /// Unknown names render with the vertical layout so a batch never stops
    /// on a single misconfigured clip.
    pub fn from_keyword_or_default(value: &str) -> Self {
        Self::from_keyword(value).unwrap_or_else(|| {
            warn!(format = value, "unknown format, falling back to vertical");
            Self::Vertical
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Square => "square",
            Self::Horizontal => "horizontal",
        }
    }

    pub fn dimensions_px(self) -> (u32, u32) {
        match self {
            Self::Vertical => (1080, 1920),
            Self::Square => (1080, 1080),
            Self::Horizontal => (1920, 1080),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Vertical => "Vertical 9:16 (Reels, Stories, Shorts, TikTok)",
            Self::Square => "Square 1:1 (Instagram post, Twitter, Mastodon)",
            Self::Horizontal => "Horizontal 16:9 (YouTube)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafeInsetsPx {
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub bottom: u32,
}

impl SafeInsetsPx {
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

/// Absolute pixel rectangle in frame coordinates (right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PixelRect {
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn contains(&self, other: &PixelRect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

/// Frame size plus optional safe-area insets for one render job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatSpec {
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub safe_area: Option<SafeInsetsPx>,
    /// Overlay the safe-area outline. Visual QA only.
    pub debug_safe_area: bool,
}

impl FormatSpec {
    pub fn preset(format: VideoFormat) -> Self {
        let (width, height) = format.dimensions_px();
        Self {
            format,
            width,
            height,
            safe_area: None,
            debug_safe_area: false,
        }
    }

    pub fn new(format: VideoFormat, width: u32, height: u32) -> CollabResult<Self> {
        if width == 0 || height == 0 {
            return Err(CollaboratorError::config(format!(
                "{} resolution must be positive, got {}x{}",
                format.keyword(),
                width,
                height
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            safe_area: None,
            debug_safe_area: false,
        })
    }

    pub fn with_safe_area(mut self, insets: SafeInsetsPx) -> CollabResult<Self> {
        if insets.left.saturating_add(insets.right) > self.width
            || insets.left > self.width / 2
            || insets.right > self.width / 2
            || insets.top > self.height / 2
            || insets.bottom > self.height / 2
        {
            return Err(CollaboratorError::config(format!(
                "{} safe area {:?} exceeds half of {}x{}",
                self.format.keyword(),
                insets,
                self.width,
                self.height
            )));
        }
        self.safe_area = (!insets.is_zero()).then_some(insets);
        Ok(self)
    }

    pub fn with_debug_safe_area(mut self, enabled: bool) -> Self {
        self.debug_safe_area = enabled;
        self
    }

    pub fn frame_rect(&self) -> PixelRect {
        PixelRect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Safe rectangle, or the whole frame when no insets are configured.
    pub fn safe_rect(&self) -> PixelRect {
        let insets = self.safe_area.unwrap_or_default();
        PixelRect {
            left: insets.left as f32,
            top: insets.top as f32,
            right: self.width.saturating_sub(insets.right) as f32,
            bottom: self.height.saturating_sub(insets.bottom) as f32,
        }
    }

    pub fn has_safe_area(&self) -> bool {
        self.safe_area.is_some()
    }
}
