//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `source` inside a `bound`×`bound` box, preserving aspect ratio.
///
/// Images already within the bound are returned unchanged (never enlarged).
/// Otherwise the longer side becomes exactly `bound` and the shorter side is
/// scaled and rounded, never below 1 pixel.
///
/// # Examples
/// ```
/// # use asset_press::imaging::fit_inside;
/// assert_eq!(fit_inside((4000, 3000), 2400), (2400, 1800));
/// assert_eq!(fit_inside((800, 600), 2400), (800, 600));
/// ```
pub fn fit_inside(source: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= bound && h <= bound {
        return source;
    }

    let scale_short = |short: u32, long: u32| -> u32 {
        ((short as f64 * bound as f64 / long as f64).round() as u32).max(1)
    };

    if w >= h {
        (bound, scale_short(h, w))
    } else {
        (scale_short(w, h), bound)
    }
}
