//! Lightweight image restoration: sharpen, tone remap, and a soft blur blend.
//!
//! The crate rasterizes an input image onto a size-bounded display buffer,
//! runs a fixed three-stage filter pipeline over it (a 3x3 sharpen
//! convolution, a linear brightness/contrast remap, and a low-opacity
//! Gaussian blend-blur), and keeps a snapshot of the original so the result
//! can always be reset. The pipeline is pure and deterministic; all session
//! state lives in an explicit [`RestoreSession`] owned by the caller.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use image_restore::{restore, save_image, RestoreSession};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let mut session = RestoreSession::new();
//! let displayed = session.load_and_rasterize(&bytes, "image/jpeg").unwrap();
//!
//! let restored = restore(&displayed).unwrap();
//! save_image(&restored, Path::new("photo_restored.png")).unwrap();
//! ```
//!
//! # Resetting
//!
//! [`RestoreSession`] retains the buffer captured at load time; any number
//! of pipeline runs later, [`RestoreSession::reset_to_original`] hands back
//! a copy of that snapshot.

#![deny(missing_docs)]

pub mod buffer;
pub mod error;
pub mod filters;
mod session;

pub use buffer::PixelBuffer;
pub use error::{Error, Result};
pub use filters::restore;
pub use session::{
    default_output_path, display_size, media_type_for_path, save_image, RestoreSession,
    MAX_DISPLAY_DIM,
};
