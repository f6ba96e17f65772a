//! Internal utility functions for imageops-matte.
//!
//! This module contains common functionality used across the matting stages.

use crate::error::AlphaMaskError;
use image::Rgba;
use imageproc::definitions::Clamp;

/// Diagonal of the RGB cube, `sqrt(3 * 255²)`.
pub const MAX_RGB_DISTANCE: f32 = 441.672_94;

/// Rounds a floating-point value and clamps it into the `u8` range.
///
/// `imageproc`'s `Clamp` truncates, so the value is rounded first. NaN maps
/// to 0, where `Clamp` alone would saturate it to 255.
#[inline]
pub fn round_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    <u8 as Clamp<f32>>::clamp(value.round())
}

/// Normalizes an alpha value using a pre-computed max value.
///
/// # Arguments
///
/// * `alpha` - The alpha value to normalize
/// * `max_value` - The pre-computed maximum value for the type
///
/// # Returns
///
/// The normalized alpha value as a floating-point number between 0 and 1
#[inline]
pub fn normalize_alpha_with_max(alpha: u8, max_value: f32) -> f32 {
    f32::from(alpha) / max_value
}

/// Grayscale luminance of an RGBA pixel in `[0, 1]`, the plain channel mean.
#[inline]
pub fn luminance(pixel: &Rgba<u8>) -> f32 {
    let Rgba([r, g, b, _]) = *pixel;
    (f32::from(r) + f32::from(g) + f32::from(b)) / (3.0 * 255.0)
}

/// Squared Euclidean distance between the RGB parts of two interleaved pixels.
#[inline]
pub fn rgb_distance_squared(a: &[u8], b: &[u8]) -> f32 {
    let dr = f32::from(a[0]) - f32::from(b[0]);
    let dg = f32::from(a[1]) - f32::from(b[1]);
    let db = f32::from(a[2]) - f32::from(b[2]);
    dr.mul_add(dr, dg.mul_add(dg, db * db))
}

/// Euclidean distance between the RGB parts of two interleaved pixels, in `[0, 441.67]`.
#[inline]
pub fn rgb_distance(a: &[u8], b: &[u8]) -> f32 {
    rgb_distance_squared(a, b).sqrt()
}

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
/// * `buffer` - Name of the offending buffer, reported in the error
pub fn validate_non_empty_image(width: u32, height: u32, buffer: &'static str) -> Result<(), AlphaMaskError> {
    if width == 0 || height == 0 {
        return Err(AlphaMaskError::EmptyImage(buffer));
    }
    Ok(())
}

/// Validates that a mask has the dimensions of the image it belongs to.
pub fn validate_matching_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), AlphaMaskError> {
    if expected != actual {
        return Err(AlphaMaskError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Fills `output` row by row, `row_len` elements at a time.
///
/// With the `rayon` feature rows are filled in parallel. The closure only
/// ever sees its own output row, so it must read from separate input buffers.
pub fn fill_rows<T, F>(output: &mut [T], row_len: usize, fill_row: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        output
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));
    }

    #[cfg(not(feature = "rayon"))]
    output
        .chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| fill_row(y, row));
}
