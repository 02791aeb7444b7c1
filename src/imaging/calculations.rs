//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output size of an aspect-preserving resize.
///
/// The result fits inside the requested box. When only one side is given,
/// the other follows from the source aspect ratio. Upscaling is allowed:
/// a 100x50 source asked to fit 400x400 comes out 400x200.
///
/// Returns `source` unchanged when neither side is given.
///
/// # Examples
/// ```
/// # use image_variations::imaging::calculations::fit_within;
/// assert_eq!(fit_within((800, 600), Some(400), Some(400)), (400, 300));
/// assert_eq!(fit_within((800, 600), None, Some(300)), (400, 300));
/// assert_eq!(fit_within((100, 50), Some(400), Some(400)), (400, 200));
/// ```
pub fn fit_within(source: (u32, u32), width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let scale_w = width.map(|w| w as f64 / src_w as f64);
    let scale_h = height.map(|h| h as f64 / src_h as f64);

    let scale = match (scale_w, scale_h) {
        (Some(w), Some(h)) => w.min(h),
        (Some(w), None) => w,
        (None, Some(h)) => h,
        (None, None) => return source,
    };

    let out_w = ((src_w as f64 * scale).round() as u32).max(1);
    let out_h = ((src_h as f64 * scale).round() as u32).max(1);
    (out_w, out_h)
}

/// Resolve the exact box for a crop-to-fit.
///
/// A missing side takes the value of the given side, giving a square box.
/// Returns `None` when neither side is set.
pub fn crop_box(width: Option<u32>, height: Option<u32>) -> Option<(u32, u32)> {
    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => Some((w, w)),
        (None, Some(h)) => Some((h, h)),
        (None, None) => None,
    }
}
