//! Pure Rust image backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, BMP, ICO, WebP) | `image` crate decoders |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop-to-fit | `DynamicImage::resize_to_fill` |
//! | Sharpening | `DynamicImage::unsharpen` |
//! | Blur | `DynamicImage::blur` |
//! | Data URL | JPEG encode + `base64` |
//! | Encode | per-format `image::codecs` encoders |
//!
//! Decoded buffers carry no EXIF and the encoders write none, so this
//! backend reports no native strip capability.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::params::{Quality, ResizeConstraint, Rgb, Sharpening};
use base64::Engine;
use image::codecs::{
    avif::AvifEncoder, bmp::BmpEncoder, gif::GifEncoder, ico::IcoEncoder, jpeg::JpegEncoder,
    png::PngEncoder, tiff::TiffEncoder, webp::WebPEncoder,
};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, Frame, GenericImageView, ImageDecoder, ImageError, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;

const FILTER: FilterType = FilterType::Lanczos3;

/// A decoded image plus the orientation its decoder reported.
#[derive(Debug, Clone)]
pub struct RustImage {
    pixels: DynamicImage,
    orientation: Orientation,
}

impl RustImage {
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(path: &Path, e: ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
}

/// Load and decode an image from disk, keeping its EXIF orientation.
fn load_image(path: &Path) -> Result<RustImage, BackendError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder().map_err(|e| decode_failed(path, e))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let pixels = DynamicImage::from_decoder(decoder).map_err(|e| decode_failed(path, e))?;
    Ok(RustImage {
        pixels,
        orientation,
    })
}

/// Encode `img` in the format named by `format` (a file extension).
fn encode_image(
    img: &DynamicImage,
    format: &str,
    quality: Quality,
    mut out: &mut dyn Write,
) -> Result<(), BackendError> {
    let failed =
        |e: ImageError| BackendError::ProcessingFailed(format!("{format} encode failed: {e}"));
    let q = quality.value() as u8;

    match format {
        "jpg" | "jpeg" => {
            let encoder = JpegEncoder::new_with_quality(out, q);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(failed)
        }
        "png" => img.write_with_encoder(PngEncoder::new(out)).map_err(failed),
        // The image crate only ships a lossless WebP encoder; quality is ignored.
        "webp" => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(out))
            .map_err(failed),
        "gif" => GifEncoder::new(out)
            .encode_frame(Frame::new(img.to_rgba8()))
            .map_err(failed),
        "bmp" => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(BmpEncoder::new(&mut out))
            .map_err(failed),
        "ico" => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(IcoEncoder::new(out))
            .map_err(failed),
        // TIFF needs a seekable sink.
        "tif" | "tiff" => {
            let mut buffer = Cursor::new(Vec::new());
            img.write_with_encoder(TiffEncoder::new(&mut buffer))
                .map_err(failed)?;
            out.write_all(buffer.get_ref())?;
            Ok(())
        }
        "avif" => {
            let encoder = AvifEncoder::new_with_speed_quality(out, 6, q);
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_with_encoder(encoder)
                .map_err(failed)
        }
        other => Err(BackendError::UnsupportedOutput(other.to_string())),
    }
}

impl ImageBackend for RustBackend {
    type Image = RustImage;

    fn load(&self, path: &Path) -> Result<RustImage, BackendError> {
        load_image(path)
    }

    fn orient(&self, image: &mut RustImage) -> Result<(), BackendError> {
        image.pixels.apply_orientation(image.orientation);
        image.orientation = Orientation::NoTransforms;
        Ok(())
    }

    fn resize(
        &self,
        image: &mut RustImage,
        width: Option<u32>,
        height: Option<u32>,
        constraint: ResizeConstraint,
    ) -> Result<(), BackendError> {
        let current = (image.pixels.width(), image.pixels.height());
        let (w, h) = match constraint {
            ResizeConstraint::Exact => (width.unwrap_or(current.0), height.unwrap_or(current.1)),
            ResizeConstraint::PreserveAspect => fit_within(current, width, height),
        };
        if (w, h) != current {
            image.pixels = image.pixels.resize_exact(w, h, FILTER);
        }
        Ok(())
    }

    fn crop_to_fit(
        &self,
        image: &mut RustImage,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        image.pixels = image.pixels.resize_to_fill(width, height, FILTER);
        Ok(())
    }

    fn sharpen(&self, image: &mut RustImage, amount: u32) -> Result<(), BackendError> {
        if let Some(sharpening) = Sharpening::from_amount(amount) {
            image.pixels = image
                .pixels
                .unsharpen(sharpening.sigma, sharpening.threshold);
        }
        Ok(())
    }

    fn blur(&self, image: &mut RustImage, radius: f32) -> Result<(), BackendError> {
        image.pixels = image.pixels.blur(radius);
        Ok(())
    }

    fn encode_data_url(&self, image: &RustImage, quality: Quality) -> Result<String, BackendError> {
        let mut bytes = Vec::new();
        encode_image(&image.pixels, "jpg", quality, &mut bytes)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(format!("data:image/jpeg;base64,{encoded}"))
    }

    fn encode_to(
        &self,
        image: &RustImage,
        format: &str,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError> {
        encode_image(&image.pixels, format, quality, out)
    }

    fn sample_color(&self, image: &RustImage, x: u32, y: u32) -> Result<Rgb, BackendError> {
        let (w, h) = image.pixels.dimensions();
        if x >= w || y >= h {
            return Err(BackendError::ProcessingFailed(format!(
                "Pixel ({x}, {y}) outside {w}x{h} image"
            )));
        }
        let px = image.pixels.get_pixel(x, y);
        Ok(Rgb([px[0], px[1], px[2]]))
    }

    fn dimensions(&self, image: &RustImage) -> Dimensions {
        Dimensions {
            width: image.pixels.width(),
            height: image.pixels.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_jpeg, create_test_png, solid_png};

    #[test]
    fn load_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();
        assert_eq!(
            backend.dimensions(&image),
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn load_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.load(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn load_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let result = RustBackend::new().load(&path);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn orient_without_exif_is_identity() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 40, 20);

        let backend = RustBackend::new();
        let mut image = backend.load(&path).unwrap();
        backend.orient(&mut image).unwrap();
        assert_eq!(image.pixels().dimensions(), (40, 20));
    }

    #[test]
    fn resize_preserve_aspect_upscales() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("small.png");
        create_test_png(&path, 16, 8);

        let backend = RustBackend::new();
        let mut image = backend.load(&path).unwrap();
        backend
            .resize(&mut image, Some(32), Some(32), ResizeConstraint::PreserveAspect)
            .unwrap();
        assert_eq!(image.pixels().dimensions(), (32, 16));
    }

    #[test]
    fn resize_exact_to_single_pixel() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 64, 48);

        let backend = RustBackend::new();
        let mut image = backend.load(&path).unwrap();
        backend
            .resize(&mut image, Some(1), Some(1), ResizeConstraint::Exact)
            .unwrap();
        assert_eq!(image.pixels().dimensions(), (1, 1));
    }

    #[test]
    fn crop_to_fit_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 800, 600);

        let backend = RustBackend::new();
        let mut image = backend.load(&path).unwrap();
        backend.crop_to_fit(&mut image, 400, 500).unwrap();
        assert_eq!(image.pixels().dimensions(), (400, 500));
    }

    #[test]
    fn sharpen_and_blur_keep_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 50, 30);

        let backend = RustBackend::new();
        let mut image = backend.load(&path).unwrap();
        backend.sharpen(&mut image, 40).unwrap();
        backend.blur(&mut image, 4.0).unwrap();
        assert_eq!(image.pixels().dimensions(), (50, 30));
    }

    #[test]
    fn sample_color_of_solid_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("solid.png");
        solid_png(&path, 10, 10, [200, 100, 50]);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();
        assert_eq!(backend.sample_color(&image, 3, 7).unwrap(), Rgb([200, 100, 50]));
    }

    #[test]
    fn sample_color_out_of_bounds_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("solid.png");
        solid_png(&path, 4, 4, [0, 0, 0]);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();
        assert!(backend.sample_color(&image, 4, 0).is_err());
    }

    #[test]
    fn data_url_is_base64_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 32, 32);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();
        let url = backend.encode_data_url(&image, Quality::new(85)).unwrap();

        let payload = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encode_jpeg_and_png_decode_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 24, 12);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();

        for format in ["jpg", "png"] {
            let mut bytes = Vec::new();
            backend
                .encode_to(&image, format, Quality::new(80), &mut bytes)
                .unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (24, 12), "{format} round trip");
        }
    }

    #[test]
    fn encode_webp_and_tiff_produce_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 8, 8);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();

        let mut webp = Vec::new();
        backend
            .encode_to(&image, "webp", Quality::default(), &mut webp)
            .unwrap();
        assert_eq!(&webp[..4], b"RIFF");

        let mut tiff = Vec::new();
        backend
            .encode_to(&image, "tif", Quality::default(), &mut tiff)
            .unwrap();
        assert!(!tiff.is_empty());
    }

    #[test]
    fn encode_unknown_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 8, 8);

        let backend = RustBackend::new();
        let image = backend.load(&path).unwrap();
        let result = backend.encode_to(&image, "psd", Quality::default(), &mut Vec::new());
        assert!(matches!(result, Err(BackendError::UnsupportedOutput(f)) if f == "psd"));
    }
}
