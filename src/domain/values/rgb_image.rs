use crate::domain::error::DomainError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// A decoded RGB8 bitmap, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Bytes needed for a `width × height` RGB8 raster, `None` on overflow.
fn raster_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
}

impl RgbImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidInput(format!(
                "Image must be non-empty, got {width}x{height}"
            )));
        }
        let expected = raster_len(width, height).ok_or_else(|| {
            DomainError::InvalidInput(format!("Image too large: {width}x{height}"))
        })?;
        if pixels.len() != expected {
            return Err(DomainError::InvalidInput(format!(
                "Expected {expected} bytes for a {width}x{height} RGB image, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Single-colour image, handy for tests and placeholders.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, DomainError> {
        let len = raster_len(width, height).ok_or_else(|| {
            DomainError::InvalidInput(format!("Image too large: {width}x{height}"))
        })?;
        let pixels = rgb.iter().copied().cycle().take(len).collect();
        Self::new(width, height, pixels)
    }

    /// Decodes any supported format (PNG, JPEG, GIF, BMP, WebP, ...) and
    /// converts it to RGB8.
    pub fn decode(bytes: &[u8]) -> Result<Self, DomainError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| DomainError::Parse(format!("Failed to decode image: {e}")))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Encodes as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, DomainError> {
        let buffer = image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| DomainError::InvalidInput("Raster does not match dimensions".into()))?;
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| DomainError::InvalidInput(format!("Failed to encode image: {e}")))?;
        Ok(png)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
