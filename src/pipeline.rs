//! Variation creation, metadata extraction and bulk deletion.
//!
//! [`VariationPipeline`] ties the resolver, an [`ImageBackend`] and a
//! [`Storage`] together. Every use-case here is synchronous and takes
//! `&self`, so one pipeline can serve parallel callers.
//!
//! ## Creating a variation
//!
//! ```text
//! alias ──resolve──▶ definition ──check format──▶ derived name
//!                                                    │
//!      source ext pass-through? ──yes──▶ storage.copy(source, derived)
//!                    │ no
//!                    ▼
//!   load → orient → strip? → crop_to_fit | resize → sharpen? → encode
//!                                                                  │
//!                                                                  ▼
//!                                                   storage.writer(derived)
//! ```
//!
//! Encoding goes to memory first. A failed encode never opens the target, so
//! an existing derived file survives it.
//!
//! Pass-through sources (`gif`, `svg` by default) are never decoded: crop,
//! resize, sharpen and quality are ignored and the bytes are copied as-is.
//!
//! ## Metadata
//!
//! Dimensions come from the oriented image. The placeholder is a 32×32
//! aspect-preserving fit, blurred with radius 4 and encoded as a JPEG data
//! URL at quality 85. The average color is the single pixel of a 1×1 exact
//! resize. Both work on their own clone of the loaded image.

use crate::imaging::calculations::crop_box;
use crate::imaging::{BackendError, ImageBackend, Quality, ResizeConstraint};
use crate::meta::ImageMeta;
use crate::naming::source_extension;
use crate::registry::RegistryError;
use crate::resolver::VariationResolver;
use crate::storage::{Storage, StorageError};
use crate::variation::VariationDefinition;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

/// Source formats the pipeline decodes by default.
pub const DEFAULT_SUPPORTED: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "ico", "webp",
];

const LQP_SIZE: u32 = 32;
const LQP_BLUR: f32 = 4.0;
const LQP_QUALITY: u32 = 85;

/// Formats listed the way error messages show them: `"jpg", "png"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatList(pub Vec<String>);

impl fmt::Display for FormatList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.join("\", \""))
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported format \"{format}\". Supported are {supported}")]
    UnsupportedFormat {
        format: String,
        supported: FormatList,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format sets the pipeline consults.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Formats that may be decoded and encoded, in display order.
    pub supported_formats: Vec<String>,
    /// Source formats copied verbatim.
    pub pass_through_formats: HashSet<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            supported_formats: DEFAULT_SUPPORTED.iter().map(|s| s.to_string()).collect(),
            pass_through_formats: crate::naming::DEFAULT_PASS_THROUGH
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineOptions {
    pub fn is_supported(&self, format: &str) -> bool {
        self.supported_formats.iter().any(|f| f == format)
    }

    pub fn is_pass_through(&self, format: &str) -> bool {
        self.pass_through_formats.contains(format)
    }
}

pub struct VariationPipeline<B: ImageBackend, S: Storage> {
    resolver: VariationResolver,
    backend: B,
    storage: S,
    options: PipelineOptions,
}

impl<B: ImageBackend, S: Storage> VariationPipeline<B, S> {
    pub fn new(resolver: VariationResolver, backend: B, storage: S) -> Self {
        Self::with_options(resolver, backend, storage, PipelineOptions::default())
    }

    pub fn with_options(
        resolver: VariationResolver,
        backend: B,
        storage: S,
        options: PipelineOptions,
    ) -> Self {
        Self {
            resolver,
            backend,
            storage,
            options,
        }
    }

    pub fn resolver(&self) -> &VariationResolver {
        &self.resolver
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Dimensions, placeholder and average color of `source`.
    ///
    /// Sources in an unsupported format get an empty [`ImageMeta`] without
    /// touching the backend.
    pub fn compute_metadata(&self, source: &str) -> Result<ImageMeta, PipelineError> {
        let supported = source_extension(source).is_some_and(|ext| self.options.is_supported(ext));
        if !supported {
            debug!(source, "unsupported format, no metadata");
            return Ok(ImageMeta::default());
        }

        let image = self.load(source)?;
        let dims = self.backend.dimensions(&image);

        let mut preview = image.clone();
        self.backend.resize(
            &mut preview,
            Some(LQP_SIZE),
            Some(LQP_SIZE),
            ResizeConstraint::PreserveAspect,
        )?;
        self.backend.blur(&mut preview, LQP_BLUR)?;
        let lqp = self
            .backend
            .encode_data_url(&preview, Quality::new(LQP_QUALITY))?;
        drop(preview);

        let mut pixel = image.clone();
        self.backend
            .resize(&mut pixel, Some(1), Some(1), ResizeConstraint::Exact)?;
        let avg_color = self.backend.sample_color(&pixel, 0, 0)?;
        drop(pixel);
        drop(image);

        debug!(
            source,
            width = dims.width,
            height = dims.height,
            color = %avg_color,
            "computed metadata"
        );
        Ok(ImageMeta {
            lqp: Some(lqp),
            avg_color: Some(avg_color),
            width: Some(dims.width),
            height: Some(dims.height),
        })
    }

    /// Materialize the variation registered as `alias` for `source`.
    ///
    /// Returns the derived filename.
    pub fn create_variation(&self, source: &str, alias: &str) -> Result<String, PipelineError> {
        let definition = self.resolver.resolve(alias)?;
        self.create_variation_with(source, definition)
    }

    /// Materialize an already resolved definition for `source`.
    pub fn create_variation_with(
        &self,
        source: &str,
        definition: &VariationDefinition,
    ) -> Result<String, PipelineError> {
        if !self.options.is_supported(&definition.extension) {
            return Err(PipelineError::UnsupportedFormat {
                format: definition.extension.clone(),
                supported: FormatList(self.options.supported_formats.clone()),
            });
        }

        let derived = self.resolver.derive_with(source, definition);

        if source_extension(source).is_some_and(|ext| self.options.is_pass_through(ext)) {
            debug!(source, derived = %derived, "pass-through copy");
            self.storage.copy(source, &derived)?;
            info!(source, derived = %derived, "created variation");
            return Ok(derived);
        }

        debug!(source, derived = %derived, id = %definition.identifier, "transforming");
        let mut image = self.load(source)?;

        if definition.crop {
            if let Some((width, height)) = crop_box(definition.width, definition.height) {
                self.backend.crop_to_fit(&mut image, width, height)?;
            }
        } else if definition.has_box() {
            self.backend.resize(
                &mut image,
                definition.width,
                definition.height,
                ResizeConstraint::PreserveAspect,
            )?;
        }

        if let Some(amount) = definition.sharpen_amount() {
            self.backend.sharpen(&mut image, amount)?;
        }

        let quality = definition.quality.map(Quality::new).unwrap_or_default();
        let mut encoded = Vec::new();
        self.backend
            .encode_to(&image, &definition.extension, quality, &mut encoded)?;
        drop(image);

        // The target is opened only once encoding succeeded.
        let mut writer = self.storage.writer(&derived)?;
        writer.write_all(&encoded)?;
        writer.flush()?;
        drop(writer);

        info!(source, derived = %derived, "created variation");
        Ok(derived)
    }

    /// Materialize every registered variation of `source` in parallel.
    ///
    /// Derived names come back in registration order. The first failure
    /// observed fails the whole call.
    pub fn create_all_variations(&self, source: &str) -> Result<Vec<String>, PipelineError> {
        let definitions: Vec<&VariationDefinition> =
            self.resolver.registry().definitions().collect();
        definitions
            .par_iter()
            .map(|definition| self.create_variation_with(source, definition))
            .collect()
    }

    /// Derived filenames of every registered variation of `source`.
    pub fn derived_names(&self, source: &str) -> Vec<String> {
        self.resolver
            .registry()
            .definitions()
            .map(|definition| self.resolver.derive_with(source, definition))
            .collect()
    }

    /// Delete every registered variation of `source` in one storage call.
    pub fn delete_variations(&self, source: &str) -> Result<(), PipelineError> {
        let names = self.derived_names(source);
        self.storage.delete_all(&names)?;
        info!(source, count = names.len(), "deleted variations");
        Ok(())
    }

    /// Load through storage, orient, then strip when the backend can.
    fn load(&self, source: &str) -> Result<B::Image, PipelineError> {
        let path = self.storage.real_path(source);
        let mut image = self.backend.load(&path)?;
        self.backend.orient(&mut image)?;
        if self.backend.supports_strip() {
            self.backend.strip_metadata(&mut image)?;
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Rgb;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::storage::tests::{MockStorage, StorageOp};

    fn resolver() -> VariationResolver {
        let mut resolver = VariationResolver::default();
        resolver
            .register(
                "thumb",
                VariationDefinition::new("t1", "jpg")
                    .size(200, 200)
                    .crop(true)
                    .quality(80),
            )
            .unwrap();
        resolver
            .register("preview", VariationDefinition::new("t2", "jpg").width(1200))
            .unwrap();
        resolver
    }

    fn pipeline() -> VariationPipeline<MockBackend, MockStorage> {
        VariationPipeline::new(resolver(), MockBackend::new(), MockStorage::new())
    }

    // =========================================================================
    // create_variation tests
    // =========================================================================

    #[test]
    fn create_thumb_crops_then_encodes() {
        let pipeline = pipeline();
        let derived = pipeline.create_variation("photos/cat.png", "thumb").unwrap();
        assert_eq!(derived, "photos/cat__t1.jpg");

        assert_eq!(
            pipeline.backend().get_operations(),
            vec![
                RecordedOp::Load("/mock/photos/cat.png".into()),
                RecordedOp::Orient,
                RecordedOp::CropToFit {
                    width: 200,
                    height: 200
                },
                RecordedOp::Encode {
                    format: "jpg".into(),
                    quality: 80
                },
            ]
        );
        assert_eq!(
            pipeline.storage().file("photos/cat__t1.jpg").unwrap(),
            b"jpg:200x200"
        );
    }

    #[test]
    fn create_without_crop_fits_preserving_aspect() {
        let pipeline = pipeline();
        pipeline.create_variation("cat.jpg", "preview").unwrap();

        let ops = pipeline.backend().get_operations();
        assert!(ops.contains(&RecordedOp::Resize {
            width: Some(1200),
            height: None,
            constraint: ResizeConstraint::PreserveAspect,
        }));
        // 800x600 upscaled to width 1200, default quality 90
        assert_eq!(pipeline.storage().file("cat__t2.jpg").unwrap(), b"jpg:1200x900");
        assert!(ops.contains(&RecordedOp::Encode {
            format: "jpg".into(),
            quality: 90
        }));
    }

    #[test]
    fn create_crop_with_single_side_uses_square_box() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("sq", "png").width(64).crop(true);
        pipeline.create_variation_with("cat.jpg", &def).unwrap();

        assert!(pipeline.backend().get_operations().contains(&RecordedOp::CropToFit {
            width: 64,
            height: 64
        }));
    }

    #[test]
    fn create_without_box_skips_resize() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("o", "webp").crop(true);
        pipeline.create_variation_with("cat.jpg", &def).unwrap();

        let ops = pipeline.backend().get_operations();
        assert!(!ops.iter().any(|op| matches!(
            op,
            RecordedOp::Resize { .. } | RecordedOp::CropToFit { .. }
        )));
    }

    #[test]
    fn create_sharpens_after_resize() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("s", "jpg").size(100, 100).sharpen(20);
        pipeline.create_variation_with("cat.jpg", &def).unwrap();

        let ops = pipeline.backend().get_operations();
        let resize = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::Resize { .. }))
            .unwrap();
        let sharpen = ops.iter().position(|op| *op == RecordedOp::Sharpen(20)).unwrap();
        assert!(resize < sharpen);
    }

    #[test]
    fn create_zero_sharpen_skips_sharpen() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("s", "jpg").sharpen(0);
        pipeline.create_variation_with("cat.jpg", &def).unwrap();

        assert!(!pipeline
            .backend()
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Sharpen(_))));
    }

    #[test]
    fn create_pass_through_copies_without_codec() {
        let storage = MockStorage::new().with_file("anim.gif", b"GIF89a");
        let pipeline = VariationPipeline::new(resolver(), MockBackend::new(), storage);

        let derived = pipeline.create_variation("anim.gif", "thumb").unwrap();
        assert_eq!(derived, "anim__t1.gif");
        assert!(pipeline.backend().get_operations().is_empty());
        assert_eq!(
            pipeline.storage().get_operations(),
            vec![StorageOp::Copy {
                source: "anim.gif".into(),
                target: "anim__t1.gif".into()
            }]
        );
        assert_eq!(pipeline.storage().file("anim__t1.gif").unwrap(), b"GIF89a");
    }

    #[test]
    fn create_unsupported_format_fails() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("p", "psd");
        let err = pipeline.create_variation_with("cat.jpg", &def).unwrap_err();

        assert!(matches!(&err, PipelineError::UnsupportedFormat { format, .. } if format == "psd"));
        assert_eq!(
            err.to_string(),
            "Unsupported format \"psd\". Supported are \"jpg\", \"jpeg\", \"png\", \"gif\", \
             \"tif\", \"tiff\", \"bmp\", \"ico\", \"webp\""
        );
        assert!(pipeline.backend().get_operations().is_empty());
        assert!(pipeline.storage().get_operations().is_empty());
    }

    #[test]
    fn create_format_check_is_case_sensitive() {
        let pipeline = pipeline();
        let def = VariationDefinition::new("u", "JPG");
        assert!(matches!(
            pipeline.create_variation_with("cat.jpg", &def),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn create_unknown_alias_fails() {
        let pipeline = pipeline();
        assert!(matches!(
            pipeline.create_variation("cat.jpg", "huge"),
            Err(PipelineError::Registry(RegistryError::NotRegistered(_)))
        ));
    }

    #[test]
    fn create_strips_only_when_backend_can() {
        let pipeline =
            VariationPipeline::new(resolver(), MockBackend::new().with_strip(), MockStorage::new());
        pipeline.create_variation("cat.jpg", "thumb").unwrap();

        let ops = pipeline.backend().get_operations();
        assert_eq!(
            &ops[..3],
            &[
                RecordedOp::Load("/mock/cat.jpg".into()),
                RecordedOp::Orient,
                RecordedOp::Strip,
            ]
        );
    }

    #[test]
    fn failed_encode_never_opens_target() {
        let storage = MockStorage::new().with_file("cat__t1.jpg", b"good");
        let pipeline =
            VariationPipeline::new(resolver(), MockBackend::new().with_failing_encode(), storage);

        assert!(matches!(
            pipeline.create_variation("cat.png", "thumb"),
            Err(PipelineError::Imaging(BackendError::ProcessingFailed(_)))
        ));
        assert!(pipeline.storage().get_operations().is_empty());
        assert_eq!(pipeline.storage().file("cat__t1.jpg").unwrap(), b"good");
    }

    #[test]
    fn create_all_returns_registration_order() {
        let pipeline = pipeline();
        let derived = pipeline.create_all_variations("photos/cat.png").unwrap();
        assert_eq!(derived, vec!["photos/cat__t1.jpg", "photos/cat__t2.jpg"]);
        assert!(pipeline.storage().file("photos/cat__t1.jpg").is_some());
        assert!(pipeline.storage().file("photos/cat__t2.jpg").is_some());
    }

    // =========================================================================
    // delete_variations tests
    // =========================================================================

    #[test]
    fn delete_submits_all_names_in_one_call() {
        let pipeline = pipeline();
        pipeline.delete_variations("photos/cat.png").unwrap();

        assert_eq!(
            pipeline.storage().get_operations(),
            vec![StorageOp::DeleteAll(vec![
                "photos/cat__t1.jpg".into(),
                "photos/cat__t2.jpg".into(),
            ])]
        );
    }

    #[test]
    fn delete_fails_when_storage_reports_failure() {
        let storage = MockStorage::new().with_undeletable("cat__t2.jpg");
        let pipeline = VariationPipeline::new(resolver(), MockBackend::new(), storage);

        assert!(matches!(
            pipeline.delete_variations("cat.jpg"),
            Err(PipelineError::Storage(StorageError::DeleteFailed(_)))
        ));
    }

    // =========================================================================
    // compute_metadata tests
    // =========================================================================

    #[test]
    fn metadata_for_unsupported_format_is_empty_without_codec() {
        let pipeline = pipeline();
        for source in ["doc.pdf", "vector.svg", "noext", "photo.JPG"] {
            assert!(pipeline.compute_metadata(source).unwrap().is_empty());
        }
        assert!(pipeline.backend().get_operations().is_empty());
    }

    #[test]
    fn metadata_recipe() {
        let pipeline = pipeline();
        let meta = pipeline.compute_metadata("photos/cat.jpg").unwrap();

        assert_eq!(meta.width, Some(800));
        assert_eq!(meta.height, Some(600));
        assert_eq!(meta.avg_color, Some(Rgb([12, 34, 56])));
        assert_eq!(meta.lqp.as_deref(), Some("data:image/jpeg;base64,32x24"));

        assert_eq!(
            pipeline.backend().get_operations(),
            vec![
                RecordedOp::Load("/mock/photos/cat.jpg".into()),
                RecordedOp::Orient,
                RecordedOp::Resize {
                    width: Some(32),
                    height: Some(32),
                    constraint: ResizeConstraint::PreserveAspect
                },
                RecordedOp::Blur(4.0),
                RecordedOp::EncodeDataUrl { quality: 85 },
                RecordedOp::Resize {
                    width: Some(1),
                    height: Some(1),
                    constraint: ResizeConstraint::Exact
                },
                RecordedOp::SampleColor { x: 0, y: 0 },
            ]
        );
    }

    #[test]
    fn format_list_display() {
        let list = FormatList(vec!["jpg".into(), "png".into()]);
        assert_eq!(list.to_string(), "\"jpg\", \"png\"");
    }

    #[test]
    fn custom_options_change_pass_through() {
        let options = PipelineOptions {
            pass_through_formats: HashSet::new(),
            ..PipelineOptions::default()
        };
        let pipeline = VariationPipeline::with_options(
            resolver(),
            MockBackend::new(),
            MockStorage::new(),
            options,
        );

        pipeline.create_variation("anim.gif", "thumb").unwrap();
        assert!(!pipeline.backend().get_operations().is_empty());
    }
}
