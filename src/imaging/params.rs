//! Parameter types for image operations.
//!
//! These types describe *what* to do to an image, not *how*. The pipeline
//! builds them from a variation definition and hands them to the
//! [`backend`](super::backend), which does the pixel work. Keeping them apart
//! lets tests swap in a mock backend and assert on the exact parameters.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters derived from a variation's sharpen amount.
//! - [`ResizeConstraint`]: Exact box vs. aspect-preserving fit.
//! - [`Rgb`]: A sampled 8-bit color.

use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Map a variation's sharpen amount (1–100) onto an unsharp mask.
    ///
    /// Amounts above 100 behave like 100. Returns `None` for 0, which means
    /// "do not sharpen".
    pub fn from_amount(amount: u32) -> Option<Self> {
        if amount == 0 {
            return None;
        }
        let amount = amount.min(100) as f32;
        Some(Self {
            sigma: 0.5 + amount * 0.025,
            threshold: 0,
        })
    }
}

/// How a resize treats the aspect ratio of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeConstraint {
    /// Scale to exactly the requested box, distorting if needed.
    Exact,
    /// Fit inside the requested box keeping the aspect ratio. Enlarging past
    /// the source resolution is allowed.
    PreserveAspect,
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Lowercase six-digit hex, e.g. `ff8000`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
