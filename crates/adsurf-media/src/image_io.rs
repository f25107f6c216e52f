//! Logo loading and preview writing.

use std::path::Path;

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::{MediaError, MediaResult};

/// The image inserted into detected surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Logo {
    /// Opaque logo, composited through a polygon mask
    Rgb(RgbImage),
    /// Logo with an alpha channel, alpha-blended
    Rgba(RgbaImage),
}

impl Logo {
    /// Decode a logo, keeping its alpha channel when it has one.
    pub fn load(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let image = image::open(path)
            .map_err(|e| MediaError::InvalidImage(format!("{}: {}", path.display(), e)))?;
        Self::from_dynamic(image)
    }

    pub fn from_dynamic(image: DynamicImage) -> MediaResult<Self> {
        let logo = if image.color().has_alpha() {
            Logo::Rgba(image.to_rgba8())
        } else {
            Logo::Rgb(image.to_rgb8())
        };
        if logo.width() < 2 || logo.height() < 2 {
            return Err(MediaError::InvalidImage(
                "logo must be at least 2x2 pixels".to_string(),
            ));
        }
        Ok(logo)
    }

    pub fn width(&self) -> u32 {
        match self {
            Logo::Rgb(img) => img.width(),
            Logo::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Logo::Rgb(img) => img.height(),
            Logo::Rgba(img) => img.height(),
        }
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height() as f64 / self.width() as f64
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Logo::Rgba(_))
    }
}

/// Write a frame as PNG, creating parent directories.
pub fn save_png(frame: &RgbImage, path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    frame.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
