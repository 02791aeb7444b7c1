//! Shared test utilities for the image-variations test suite.
//!
//! Synthetic image writers for backend and pipeline tests. Every helper
//! creates missing parent directories and panics on failure.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("photos/cat.jpg"), 800, 600);
//! solid_png(&tmp.path().join("red.png"), 4, 4, [255, 0, 0]);
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::Path;

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a gradient JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a gradient PNG of the given size.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height).save(path).unwrap();
}

/// Write a single-color PNG.
pub fn solid_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    ensure_parent(path);
    RgbImage::from_pixel(width, height, image::Rgb(rgb))
        .save(path)
        .unwrap();
}
