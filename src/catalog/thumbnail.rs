//! Level thumbnails.
//!
//! Thumbnails are decoded with the `image` crate and shrunk to fit a small
//! pixel grid. The UI draws two pixel rows per terminal cell using half-block
//! characters.

use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

/// Maximum preview width in pixels (one pixel per terminal column).
pub const THUMBNAIL_WIDTH: u32 = 24;

/// Maximum preview height in pixels (two pixels per terminal row).
pub const THUMBNAIL_HEIGHT: u32 = 16;

#[derive(Debug, Error)]
#[error("failed to load thumbnail: {0}")]
pub struct ThumbnailError(#[from] image::ImageError);

/// A downscaled RGB preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Thumbnail {
    /// Decodes the image at `path` and fits it into the preview grid.
    pub fn load(path: &Path) -> Result<Self, ThumbnailError> {
        let image = image::open(path)?;
        Ok(Self::from_image(&image))
    }

    /// Fits an already decoded image into the preview grid, keeping its
    /// aspect ratio.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image
            .resize(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle)
            .to_rgb8();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.pixels().map(|p| p.0).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y), or `None` outside the preview.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            self.pixels.get((y * self.width + x) as usize).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_downscale_keeps_aspect() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(96, 32, Rgb([200, 10, 10])));
        let thumb = Thumbnail::from_image(&image);
        assert_eq!(thumb.width(), THUMBNAIL_WIDTH);
        assert_eq!(thumb.height(), 8);
        assert_eq!(thumb.pixel(0, 0), Some([200, 10, 10]));
        assert_eq!(thumb.pixel(THUMBNAIL_WIDTH, 0), None);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.png");
        RgbImage::from_pixel(48, 32, Rgb([0, 128, 255]))
            .save(&path)
            .unwrap();

        let thumb = Thumbnail::load(&path).unwrap();
        assert_eq!(thumb.width(), THUMBNAIL_WIDTH);
        assert_eq!(thumb.height(), THUMBNAIL_HEIGHT);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Thumbnail::load(Path::new("no/such/thumb.png")).is_err());
    }
}
