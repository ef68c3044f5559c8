use std::path::Path;

use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};
use tracing::{debug, warn};

use crate::error::{CollabResult, CollaboratorError};

/// Podcast logo decoded and scaled once per render job, then shared
/// read-only by every frame.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pixmap: Pixmap,
}

impl LogoImage {
    /// Decode `path` and resize it to a `size × size` square (Lanczos3).
    pub fn load(path: &Path, size: u32) -> CollabResult<Self> {
        let logo_error = |message: String| CollaboratorError::Logo {
            path: path.to_path_buf(),
            message,
        };
        let image = ImageReader::open(path)
            .map_err(|error| logo_error(format!("failed opening: {error}")))?
            .with_guessed_format()
            .map_err(|error| logo_error(format!("failed sniffing format: {error}")))?
            .decode()
            .map_err(|error| logo_error(format!("failed decoding: {error}")))?
            .to_rgba8();
        debug!(
            path = %path.display(),
            source_width = image.width(),
            source_height = image.height(),
            size,
            "decoded logo"
        );
        Self::from_rgba(&image, size)
            .ok_or_else(|| logo_error(format!("cannot scale logo to {size}px")))
    }

    /// `None` when `size` is zero.
    pub fn from_rgba(image: &RgbaImage, size: u32) -> Option<Self> {
        if size == 0 || image.width() == 0 || image.height() == 0 {
            return None;
        }
        let scaled = if image.dimensions() == (size, size) {
            image.clone()
        } else {
            image::imageops::resize(image, size, size, FilterType::Lanczos3)
        };

        let mut pixmap = Pixmap::new(size, size)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(scaled.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Some(Self { pixmap })
    }

    /// Missing or undecodable logos are not fatal: the frame is drawn without one.
    pub fn load_optional(path: Option<&Path>, size: u32) -> Option<Self> {
        let path = path?;
        if !path.exists() {
            warn!(path = %path.display(), "logo not found, rendering without it");
            return None;
        }
        match Self::load(path, size) {
            Ok(logo) => Some(logo),
            Err(error) => {
                warn!(%error, "logo unusable, rendering without it");
                None
            }
        }
    }

    pub fn size(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}
