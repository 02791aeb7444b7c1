//! Variation definitions.
//!
//! A [`VariationDefinition`] is the immutable recipe behind one named
//! variation: output format, optional box, quality, sharpening and whether
//! to crop. Definitions are built at configuration time (usually
//! deserialized from the `[variations.<alias>]` tables of the config file)
//! and never change afterwards.

use serde::{Deserialize, Serialize};

/// Longest identifier accepted at registration.
pub const MAX_ID_LEN: usize = 30;

/// Recipe for one named variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariationDefinition {
    /// Short token embedded in derived filenames.
    #[serde(rename = "id")]
    pub identifier: String,
    /// Output format, as a file extension (`jpg`, `webp`, ...).
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Encoder quality, 0–100. `None` uses the encoder default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// Sharpen amount. `None` or 0 skips sharpening.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpen: Option<u32>,
    /// Crop to the exact box instead of fitting inside it.
    #[serde(default)]
    pub crop: bool,
}

impl VariationDefinition {
    /// Start a definition with no resize, default quality and no sharpening.
    pub fn new(identifier: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            extension: extension.into(),
            width: None,
            height: None,
            quality: None,
            sharpen: None,
            crop: false,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn sharpen(mut self, amount: u32) -> Self {
        self.sharpen = Some(amount);
        self
    }

    pub fn crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    /// True when either side of the box is set.
    pub fn has_box(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Sharpen amount, if sharpening applies.
    pub fn sharpen_amount(&self) -> Option<u32> {
        self.sharpen.filter(|&amount| amount > 0)
    }
}

/// Check an identifier against `[A-Za-z0-9x]{1,30}`.
///
/// Returns the reason on failure.
pub fn check_identifier(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("identifier is empty".to_string());
    }
    if id.len() > MAX_ID_LEN {
        return Err(format!(
            "identifier is {} characters, at most {MAX_ID_LEN} allowed",
            id.len()
        ));
    }
    if let Some(bad) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(format!("identifier contains {bad:?}, only A-Z, a-z, 0-9 allowed"));
    }
    Ok(())
}
