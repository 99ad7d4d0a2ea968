//! Owned RGBA pixel buffers.

use image::RgbaImage;

use crate::error::{Error, Result};

/// Interleaved channels per pixel (red, green, blue, alpha).
pub const CHANNELS: usize = 4;

/// A rectangular RGBA raster: row-major, top-to-bottom, 8 bits per channel.
///
/// The backing storage is always exactly `width * height * 4` bytes; the
/// constructors enforce this, so every constructed buffer is well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Build a buffer from raw interleaved RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBuffer`] if `data.len()` is not exactly
    /// `width * height * 4`, or if that product overflows `usize`.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        check_rgba_len(&data, width, height)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a buffer from a decoded [`RgbaImage`].
    ///
    /// Infallible: the `image` crate guarantees the length invariant.
    #[must_use]
    pub fn from_image(img: RgbaImage) -> Self {
        let width = img.width();
        let height = img.height();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }

    /// Convert back into an [`RgbaImage`] for encoding or display.
    ///
    /// # Panics
    ///
    /// Never panics for buffers built through the public constructors; the
    /// length invariant holds by construction.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data)
            .expect("buffer length matches dimensions")
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw interleaved RGBA bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The four channel bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        &self.data[idx..idx + CHANNELS]
    }
}

/// Validate that `data` holds exactly `width * height * 4` bytes.
pub(crate) fn check_rgba_len(data: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS));
    match expected {
        Some(len) if len == data.len() => Ok(()),
        _ => Err(Error::InvalidBuffer(format!(
            "{} bytes does not match {width}x{height} RGBA",
            data.len()
        ))),
    }
}
