//! Error types for the image-restore crate.

/// Errors that can occur while loading, restoring, or exporting an image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The declared media type of the input is not an image type, or an
    /// export target's format is not supported.
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// A reset or restore was requested before any image was loaded.
    #[error("no image loaded")]
    NoImageLoaded,

    /// A pixel buffer's length does not match its declared dimensions.
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let media = Error::UnsupportedMedia("text/plain".to_string());
        assert!(media.to_string().contains("text/plain"));

        let buffer = Error::InvalidBuffer("12 bytes does not match 2x2 RGBA".to_string());
        assert!(buffer.to_string().contains("2x2"));

        assert_eq!(Error::NoImageLoaded.to_string(), "no image loaded");
    }
}
