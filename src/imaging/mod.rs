//! Image processing behind a backend trait.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orient** | `ImageReader` + `ImageDecoder::orientation` |
//! | **Fit / exact resize** | Lanczos3 `resize_exact` |
//! | **Crop to fit** | `resize_to_fill` |
//! | **Sharpen / blur** | `unsharpen` / `blur` |
//! | **Placeholder** | JPEG → `base64` data URL |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{Quality, ResizeConstraint, Rgb, Sharpening};
pub use rust_backend::{RustBackend, RustImage};
