//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::engine::Dimensions;

/// Resampling operation chosen for one target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resample {
    /// Shrink (or keep) into the exact target box.
    Downscale,
    /// Grow into the exact target box.
    Enlarge,
}

/// Decide between downscaling and enlarging.
///
/// Downscale is chosen when **either** natural axis is at least as large as
/// the target axis; enlarge only when the source is strictly smaller on both
/// axes. A source that is wider but shorter than the target therefore takes
/// the downscale path, and the engine's exact resize stretches the short axis.
///
/// # Examples
/// ```
/// # use akira::imaging::{Dimensions, Resample, choose_resample};
/// let natural = Dimensions { width: 100, height: 100 };
/// let small = Dimensions { width: 50, height: 50 };
/// let large = Dimensions { width: 200, height: 200 };
/// assert_eq!(choose_resample(natural, small), Resample::Downscale);
/// assert_eq!(choose_resample(natural, large), Resample::Enlarge);
/// ```
pub fn choose_resample(natural: Dimensions, target: Dimensions) -> Resample {
    if natural.width >= target.width || natural.height >= target.height {
        Resample::Downscale
    } else {
        Resample::Enlarge
    }
}
