use serde::{Deserialize, Serialize};
use tracing::warn;

pub const COLOR_ORANGE: Rgb = Rgb::new(242, 101, 34);
pub const COLOR_BEIGE: Rgb = Rgb::new(235, 213, 197);
pub const COLOR_WHITE: Rgb = Rgb::new(255, 255, 255);
pub const COLOR_BLACK: Rgb = Rgb::new(50, 50, 50);

/// Alpha given to the subtitle background when the configured color has none.
pub const SUBTITLE_BG_ALPHA: u8 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub const fn opaque(self) -> Rgba {
        self.with_alpha(255)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Palette shared by every frame of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTheme {
    /// Header/footer bands and equalizer bars.
    pub primary: Rgb,
    pub background: Rgb,
    pub text: Rgb,
    /// Always carries an alpha; subtitle cards are composited, never painted opaque.
    pub subtitle_background: Rgba,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            primary: COLOR_ORANGE,
            background: COLOR_BEIGE,
            text: COLOR_WHITE,
            subtitle_background: COLOR_BLACK.with_alpha(SUBTITLE_BG_ALPHA),
        }
    }
}

/// Colors as they appear in YAML: `[r, g, b]` or `[r, g, b, a]` lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_bg: Option<Vec<u8>>,
}

impl ThemeConfig {
    /// Key-by-key merge: values present in `other` win.
    pub fn merge(&mut self, other: &ThemeConfig) {
        if other.primary.is_some() {
            self.primary.clone_from(&other.primary);
        }
        if other.background.is_some() {
            self.background.clone_from(&other.background);
        }
        if other.text.is_some() {
            self.text.clone_from(&other.text);
        }
        if other.transcript_bg.is_some() {
            self.transcript_bg.clone_from(&other.transcript_bg);
        }
    }
}

impl ColorTheme {
    /// Resolve a theme from optional list-typed colors, falling back to the
    /// built-in palette for anything absent or malformed.
    pub fn resolve(config: Option<&ThemeConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            primary: resolve_rgb(config.primary.as_deref(), "primary", defaults.primary),
            background: resolve_rgb(
                config.background.as_deref(),
                "background",
                defaults.background,
            ),
            text: resolve_rgb(config.text.as_deref(), "text", defaults.text),
            subtitle_background: config
                .transcript_bg
                .as_deref()
                .and_then(|list| color_from_list(list, "transcript_bg"))
                .map(|(rgb, alpha)| rgb.with_alpha(alpha.unwrap_or(SUBTITLE_BG_ALPHA)))
                .unwrap_or(defaults.subtitle_background),
        }
    }
}

fn resolve_rgb(list: Option<&[u8]>, name: &str, fallback: Rgb) -> Rgb {
    list.and_then(|list| color_from_list(list, name))
        .map(|(rgb, _)| rgb)
        .unwrap_or(fallback)
}

fn color_from_list(list: &[u8], name: &str) -> Option<(Rgb, Option<u8>)> {
    match *list {
        [r, g, b] => Some((Rgb::new(r, g, b), None)),
        [r, g, b, a] => Some((Rgb::new(r, g, b), Some(a))),
        _ => {
            warn!(
                color = name,
                len = list.len(),
                "color list must have 3 or 4 components, using default"
            );
            None
        }
    }
}
