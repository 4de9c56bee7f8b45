/// Decoded image consumed by texture uniforms
///
/// Decoding lives outside the frame core; this is only the in-memory form a
/// backend uploads. Texture uniforms hold images behind `Arc`, and backends
/// skip re-uploading a texture unit whose bound image is the same `Arc`.
/// Pixels cannot change behind a shared `Arc<Image>`, so a new upload always
/// comes with a new allocation.

use crate::error::{Error, Result};

/// Pixel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// 8 bits per channel, 4 channels
    #[default]
    Rgba8,
}

impl ImageFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl Image {
    /// Wrap raw RGBA8 pixels
    ///
    /// # Errors
    ///
    /// `InvalidResource` if `data` does not hold exactly `width * height` pixels.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::Rgba8;
        let expected = byte_len(width, height, format)?;
        if data.len() != expected {
            return Err(Error::InvalidResource(format!(
                "Image {}x{} needs {} bytes, got {}",
                width, height, expected, data.len()
            )));
        }
        Ok(Self { data, width, height, format })
    }

    /// Single-color image
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the pixel storage size overflows `usize`.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let format = ImageFormat::Rgba8;
        let pixels = byte_len(width, height, format)? / format.bytes_per_pixel();
        Ok(Self { data: rgba.repeat(pixels), width, height, format })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

fn byte_len(width: u32, height: u32, format: ImageFormat) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| Error::InvalidResource(format!("Image {}x{} is too large", width, height)))
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
