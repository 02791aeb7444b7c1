//! Lightweight image metadata shown before the full image loads.

use crate::imaging::Rgb;
use serde::{Serialize, Serializer};

/// Dimensions, low-quality placeholder and average color of a source image.
///
/// Every field is absent for sources in an unsupported format. Serializes
/// with keys in the order `lqp`, `avgColor`, `width`, `height`, absent
/// fields as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
    /// `data:` URL of a tiny blurred preview.
    pub lqp: Option<String>,
    #[serde(rename = "avgColor", serialize_with = "serialize_color")]
    pub avg_color: Option<Rgb>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn serialize_color<S: Serializer>(color: &Option<Rgb>, serializer: S) -> Result<S::Ok, S::Error> {
    match color {
        Some(rgb) => serializer.serialize_str(&rgb.to_hex()),
        None => serializer.serialize_none(),
    }
}
