//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the variation pipeline and
//! the pixel work. A backend hands out an owned image handle
//! ([`ImageBackend::Image`]); cloning a handle gives an independent copy and
//! dropping it releases the pixels.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::params::{Quality, ResizeConstraint, Rgb};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),
}

/// Pixel dimensions of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// Operations mutate the handle in place so the pipeline can chain them in
/// the order a variation requires (orient, strip, resize or crop, sharpen,
/// encode).
pub trait ImageBackend: Sync {
    /// Decoded image handle. `clone()` must produce an independent copy.
    type Image: Clone;

    /// Decode an image from disk, remembering any EXIF orientation.
    fn load(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Apply the orientation recorded at load time.
    fn orient(&self, image: &mut Self::Image) -> Result<(), BackendError>;

    /// Whether [`strip_metadata`](Self::strip_metadata) does anything.
    fn supports_strip(&self) -> bool {
        false
    }

    /// Drop embedded metadata (EXIF, ICC, comments) from the handle.
    fn strip_metadata(&self, _image: &mut Self::Image) -> Result<(), BackendError> {
        Ok(())
    }

    /// Resize under the given constraint.
    ///
    /// With [`ResizeConstraint::Exact`] a missing side keeps the current
    /// size of that side.
    fn resize(
        &self,
        image: &mut Self::Image,
        width: Option<u32>,
        height: Option<u32>,
        constraint: ResizeConstraint,
    ) -> Result<(), BackendError>;

    /// Fill the exact box, cropping whatever overflows (centered).
    fn crop_to_fit(
        &self,
        image: &mut Self::Image,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError>;

    /// Sharpen by `amount` (1–100).
    fn sharpen(&self, image: &mut Self::Image, amount: u32) -> Result<(), BackendError>;

    /// Gaussian blur with the given radius.
    fn blur(&self, image: &mut Self::Image, radius: f32) -> Result<(), BackendError>;

    /// Encode as an embeddable `data:` URL.
    fn encode_data_url(&self, image: &Self::Image, quality: Quality)
    -> Result<String, BackendError>;

    /// Encode in `format` (a file extension such as `jpg`) into `out`.
    fn encode_to(
        &self,
        image: &Self::Image,
        format: &str,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError>;

    /// Read the RGB value of one pixel.
    fn sample_color(&self, image: &Self::Image, x: u32, y: u32) -> Result<Rgb, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;
}
