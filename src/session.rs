//! Image loading, display sizing, and the reset-to-original snapshot.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, ImageFormat, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::filters;

/// Maximum display dimension in pixels; larger images are scaled down.
pub const MAX_DISPLAY_DIM: u32 = 1000;

/// Compute the bounded display size for an image's natural dimensions.
///
/// If either dimension exceeds [`MAX_DISPLAY_DIM`], both are scaled by
/// `min(cap / width, cap / height)` and rounded to the nearest integer, so
/// the aspect ratio is preserved and the larger dimension lands exactly on
/// the cap. Smaller images pass through unchanged.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_DISPLAY_DIM && height <= MAX_DISPLAY_DIM {
        return (width, height);
    }
    let cap = f64::from(MAX_DISPLAY_DIM);
    let ratio = (cap / f64::from(width)).min(cap / f64::from(height));
    (
        (f64::from(width) * ratio).round() as u32,
        (f64::from(height) * ratio).round() as u32,
    )
}

/// Session state for one loaded image.
///
/// Owns the displayed pixel buffer and the original snapshot captured at
/// load time, replacing the free-floating globals a UI layer would otherwise
/// keep. Create once and pass by `&mut` into the entry points; every
/// returned buffer is a standalone copy, so later pipeline runs can never
/// corrupt the retained original.
#[derive(Debug, Default)]
pub struct RestoreSession {
    current: Option<PixelBuffer>,
    original: Option<PixelBuffer>,
}

impl RestoreSession {
    /// Create an empty session with no image loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode image bytes and rasterize them at the bounded display size.
    ///
    /// The declared media type is checked before any decode attempt; this is
    /// the only validation performed on the input. On success both the
    /// displayed buffer and the original snapshot are replaced. On any
    /// failure the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMedia`] if `media_type` is not an image
    /// type, or [`Error::Image`] if the bytes cannot be decoded.
    pub fn load_and_rasterize(&mut self, bytes: &[u8], media_type: &str) -> Result<PixelBuffer> {
        if !media_type.starts_with("image/") {
            return Err(Error::UnsupportedMedia(media_type.to_string()));
        }

        let decoded = image::load_from_memory(bytes)?;
        let (dw, dh) = display_size(decoded.width(), decoded.height());
        let rgba = if (dw, dh) == (decoded.width(), decoded.height()) {
            decoded.into_rgba8()
        } else {
            image::imageops::resize(&decoded.into_rgba8(), dw, dh, FilterType::Triangle)
        };

        let buffer = PixelBuffer::from_image(rgba);
        self.original = Some(buffer.clone());
        self.current = Some(buffer.clone());
        Ok(buffer)
    }

    /// Run the restoration pipeline on the displayed buffer and store the
    /// result as the new displayed buffer.
    ///
    /// The original snapshot is not affected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageLoaded`] if nothing has been loaded yet.
    pub fn restore(&mut self) -> Result<PixelBuffer> {
        let current = self.current.as_ref().ok_or(Error::NoImageLoaded)?;
        let restored = filters::restore(current)?;
        self.current = Some(restored.clone());
        Ok(restored)
    }

    /// Overwrite the displayed buffer with a copy of the original snapshot.
    ///
    /// Returns a defensive copy, never a shared reference, and is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageLoaded`] if nothing has been loaded yet.
    pub fn reset_to_original(&mut self) -> Result<PixelBuffer> {
        let original = self.original.as_ref().ok_or(Error::NoImageLoaded)?;
        let copy = original.clone();
        self.current = Some(copy.clone());
        Ok(copy)
    }

    /// The currently displayed buffer, if an image has been loaded.
    #[must_use]
    pub fn current(&self) -> Option<&PixelBuffer> {
        self.current.as_ref()
    }

    /// The original snapshot, if an image has been loaded.
    #[must_use]
    pub fn original(&self) -> Option<&PixelBuffer> {
        self.original.as_ref()
    }
}

/// Map a file extension to the media type declared on load.
///
/// Covers the formats the crate can both decode and re-encode.
#[must_use]
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase()
        .as_str()
    {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Save a pixel buffer with format-specific encoder settings.
///
/// The format is taken from the path extension. JPEG output drops the alpha
/// channel and encodes at quality 100.
///
/// # Errors
///
/// Returns [`Error::UnsupportedMedia`] for formats the crate does not
/// encode, or an I/O or encoding error from writing the file.
pub fn save_image(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedMedia(e.to_string()))?;

    let img: RgbaImage = buffer.clone().into_image();

    match format {
        ImageFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(img).into_rgb8();
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&rgb)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedMedia(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_restored.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    match input.extension() {
        Some(ext) => parent.join(format!("{stem}_restored.{}", ext.to_string_lossy())),
        None => parent.join(format!("{stem}_restored")),
    }
}
