use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use tracing::{debug, warn};

use crate::error::{CollabResult, CollaboratorError};

const REGULAR_FONT_CANDIDATES: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_FONT_CANDIDATES: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Constant vertical metrics for a font at one pixel size.
///
/// Every line of a block uses these, never the bbox of its own glyphs, so
/// line positions do not jump between frames with different text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from the top of the line to the baseline.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line (positive).
    pub descent: f32,
}

impl LineMetrics {
    pub fn line_height(&self) -> f32 {
        (self.ascent + self.descent).ceil()
    }
}

/// Coverage mask for one glyph, positioned relative to the pen and baseline.
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Left bearing from the pen position.
    pub xmin: i32,
    /// Offset of the bitmap's bottom edge above the baseline.
    pub ymin: i32,
    pub coverage: Vec<u8>,
}

pub trait Face: Send + Sync {
    fn name(&self) -> &str;

    fn advance(&self, ch: char, px: f32) -> f32;

    fn line_metrics(&self, px: f32) -> LineMetrics;

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap;

    /// Sum of advances; no kerning or shaping.
    fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, px)).sum()
    }
}

pub struct FontdueFace {
    name: String,
    font: Font,
}

impl FontdueFace {
    pub fn from_bytes(bytes: Vec<u8>, name: impl Into<String>) -> Result<Self, &'static str> {
        let font = Font::from_bytes(bytes, FontSettings::default())?;
        Ok(Self {
            name: name.into(),
            font,
        })
    }

    pub fn from_path(path: &Path) -> CollabResult<Self> {
        let bytes = fs::read(path).map_err(|error| CollaboratorError::Font {
            path: path.to_path_buf(),
            message: format!("failed to read font file: {error}"),
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(bytes, name).map_err(|error| CollaboratorError::Font {
            path: path.to_path_buf(),
            message: format!("failed to parse font: {error}"),
        })
    }
}

impl Face for FontdueFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        match self.font.horizontal_line_metrics(px) {
            Some(metrics) => LineMetrics {
                ascent: metrics.ascent,
                descent: -metrics.descent,
            },
            None => BlockFace.line_metrics(px),
        }
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            coverage,
        }
    }
}

/// Built-in face used when no font file is available: every character
/// advances half an em and non-space characters draw as a solid block.
///
/// Output is legible as layout, not as text, but it keeps a render job alive
/// and makes text geometry exactly predictable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFace;

impl BlockFace {
    pub const ADVANCE_EM: f32 = 0.5;
}

impl Face for BlockFace {
    fn name(&self) -> &str {
        "builtin-block"
    }

    fn advance(&self, _ch: char, px: f32) -> f32 {
        px * Self::ADVANCE_EM
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        LineMetrics {
            ascent: px * 0.8,
            descent: px * 0.2,
        }
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        if ch.is_whitespace() {
            return GlyphBitmap::default();
        }
        let width = (px * 0.4).round().max(1.0) as usize;
        let height = (px * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: (px * 0.05).round() as i32,
            ymin: 0,
            coverage: vec![255; width * height],
        }
    }
}

/// Regular and bold faces for one render job, shared read-only by all frames.
#[derive(Clone)]
pub struct FontSet {
    pub regular: Arc<dyn Face>,
    pub bold: Arc<dyn Face>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.name())
            .field("bold", &self.bold.name())
            .finish()
    }
}

impl FontSet {
    pub fn builtin() -> Self {
        let face: Arc<dyn Face> = Arc::new(BlockFace);
        Self {
            regular: face.clone(),
            bold: face,
        }
    }

    /// Configured paths first, then well-known system fonts, then the
    /// built-in block face. Never fails.
    pub fn resolve(regular: Option<&Path>, bold: Option<&Path>) -> Self {
        let regular_face = load_first(regular, &REGULAR_FONT_CANDIDATES, "regular");
        let bold_face = load_first(bold, &BOLD_FONT_CANDIDATES, "bold");

        match (regular_face, bold_face) {
            (Some(regular), Some(bold)) => Self { regular, bold },
            (Some(regular), None) => Self {
                bold: regular.clone(),
                regular,
            },
            (None, Some(bold)) => Self {
                regular: bold.clone(),
                bold,
            },
            (None, None) => {
                warn!("no usable font found, rendering text with the built-in block face");
                Self::builtin()
            }
        }
    }
}

fn load_first(configured: Option<&Path>, candidates: &[&str], role: &str) -> Option<Arc<dyn Face>> {
    if let Some(path) = configured {
        match FontdueFace::from_path(path) {
            Ok(face) => {
                debug!(role, path = %path.display(), "loaded configured font");
                return Some(Arc::new(face) as Arc<dyn Face>);
            }
            Err(error) => warn!(role, %error, "configured font unusable, searching system fonts"),
        }
    }

    candidates
        .iter()
        .map(PathBuf::from)
        .filter(|path| path.is_file())
        .find_map(|path| match FontdueFace::from_path(&path) {
            Ok(face) => {
                debug!(role, path = %path.display(), "loaded system font");
                Some(Arc::new(face) as Arc<dyn Face>)
            }
            Err(error) => {
                debug!(role, %error, "skipping system font");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_face_measures_fixed_advance() {
        let face = BlockFace;
        assert_eq!(face.measure("abcd", 20.0), 40.0);
        assert_eq!(face.measure("", 20.0), 0.0);
    }

    #[test]
    fn block_face_space_has_no_ink() {
        let glyph = BlockFace.rasterize(' ', 32.0);
        assert_eq!(glyph.width * glyph.height, 0);
        let glyph = BlockFace.rasterize('x', 32.0);
        assert!(glyph.coverage.iter().all(|&c| c == 255));
        assert_eq!(glyph.coverage.len(), glyph.width * glyph.height);
    }

    #[test]
    fn line_height_uses_constant_metrics() {
        let metrics = BlockFace.line_metrics(30.0);
        assert_eq!(metrics.line_height(), 30.0);
    }

    #[test]
    fn unreadable_font_path_is_a_font_error() {
        let err = FontdueFace::from_path(Path::new("/definitely/not/here.ttf"))
            .err()
            .expect("missing font should fail");
        assert!(matches!(err, CollaboratorError::Font { .. }));
    }

    #[test]
    fn garbage_bytes_do_not_parse() {
        assert!(FontdueFace::from_bytes(vec![0, 1, 2, 3], "junk").is_err());
    }

    #[test]
    fn resolve_never_fails() {
        let fonts = FontSet::resolve(Some(Path::new("/nope.ttf")), None);
        assert!(!fonts.regular.name().is_empty());
    }
}
