//! Trimap labels and thresholding of probability masks.
//!
//! A trimap is a [`Luma<u8>`] mask where `0` is definite background, `255`
//! is definite foreground and every other value means "unknown".

use crate::error::SegmentationError;
use image::Luma;
use imageproc::definitions::Image;
use imageproc::map::map_colors;

/// Definite background label
pub const BACKGROUND: u8 = 0;
/// Definite foreground label
pub const FOREGROUND: u8 = 255;
/// Conventional label for unknown pixels
pub const UNKNOWN: u8 = 128;

/// Default `(low, high)` probability thresholds for [`trimap_from_probability`]
pub const DEFAULT_PROBABILITY_THRESHOLDS: (f32, f32) = (0.15, 0.85);

/// Returns `true` for any value that is neither definite background nor foreground
#[inline]
pub const fn is_unknown(value: u8) -> bool {
    value != BACKGROUND && value != FOREGROUND
}

/// Counts the unknown pixels of a trimap
pub fn count_unknown(trimap: &Image<Luma<u8>>) -> usize {
    trimap.as_raw().iter().filter(|&&v| is_unknown(v)).count()
}

/// Converts a foreground probability mask into a trimap
///
/// Values above `high` become [`FOREGROUND`], values in `(low, high]` become
/// [`UNKNOWN`] and the rest [`BACKGROUND`].
///
/// # Errors
///
/// * `SegmentationError::InvalidThresholds` - Unless `0 <= low < high <= 1`
/// * `SegmentationError::EmptyImage` - When the mask has zero area
///
/// # Examples
///
/// ```
/// use image::Luma;
/// use imageops_matte::{trimap_from_probability, Image};
///
/// let probability: Image<Luma<f32>> =
///     Image::from_fn(3, 1, |x, _| Luma([[0.1, 0.5, 0.9][x as usize]]));
/// let trimap = trimap_from_probability(&probability, 0.15, 0.85).unwrap();
/// assert_eq!(trimap.as_raw(), &vec![0, 128, 255]);
/// ```
pub fn trimap_from_probability(
    probability: &Image<Luma<f32>>,
    low: f32,
    high: f32,
) -> Result<Image<Luma<u8>>, SegmentationError> {
    validate_thresholds(low, high)?;
    let (width, height) = probability.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage {
            buffer: "probability mask",
        });
    }

    Ok(map_colors(probability, |Luma([p])| Luma([label(p, low, high)])))
}

/// Relabels a continuous 8-bit mask, such as a smoothed trimap, into a trimap
///
/// The mask is read as `value / 255` and labelled with the rules of
/// [`trimap_from_probability`]. A trimap that already holds only
/// `0`, `128` and `255` is returned unchanged for thresholds that keep
/// `0.5` unknown.
///
/// # Errors
///
/// * `SegmentationError::InvalidThresholds` - Unless `0 <= low < high <= 1`
/// * `SegmentationError::EmptyImage` - When the mask has zero area
///
/// # Examples
///
/// ```
/// use image::Luma;
/// use imageops_matte::{trimap_from_mask, Image};
///
/// let smoothed: Image<Luma<u8>> = Image::from_fn(4, 1, |x, _| Luma([[3, 90, 200, 250][x as usize]]));
/// let trimap = trimap_from_mask(&smoothed, 0.15, 0.85).unwrap();
/// assert_eq!(trimap.as_raw(), &vec![0, 128, 128, 255]);
/// ```
pub fn trimap_from_mask(
    mask: &Image<Luma<u8>>,
    low: f32,
    high: f32,
) -> Result<Image<Luma<u8>>, SegmentationError> {
    validate_thresholds(low, high)?;
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage { buffer: "mask" });
    }

    Ok(map_colors(mask, |Luma([v])| {
        Luma([label(f32::from(v) / 255.0, low, high)])
    }))
}

#[inline]
fn label(p: f32, low: f32, high: f32) -> u8 {
    if p > high {
        FOREGROUND
    } else if p > low {
        UNKNOWN
    } else {
        BACKGROUND
    }
}

fn validate_thresholds(low: f32, high: f32) -> Result<(), SegmentationError> {
    if !(0.0 <= low && low < high && high <= 1.0) {
        return Err(SegmentationError::InvalidThresholds { low, high });
    }
    Ok(())
}
