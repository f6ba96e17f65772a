use crate::error::BilateralFilterError;
use crate::utils::{fill_rows, rgb_distance_squared, round_to_u8};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use log::warn;

/// Spatial sigma above which the quadratic window cost becomes noticeable
const LARGE_SPATIAL_SIGMA: f32 = 10.0;

/// Extension trait applying a cross (joint) bilateral filter to a mask
///
/// Neighbors are weighted by spatial distance and by RGB similarity in the
/// guide image, so the mask is smoothed within color regions but not across
/// color edges.
pub trait BilateralFilterExt {
    /// Smooths the mask with weights taken from `guide`
    ///
    /// The window radius is `ceil(2 * spatial_sigma)`. Cost is
    /// `O(width * height * radius²)`, so keep `spatial_sigma` small.
    ///
    /// # Arguments
    ///
    /// * `guide` - Color image providing the range weights
    /// * `spatial_sigma` - Standard deviation of the spatial Gaussian, in pixels
    /// * `range_sigma` - Standard deviation of the color Gaussian, on RGB
    ///   distances normalized per channel to `[0, 1]`. `f32::INFINITY` gives a
    ///   pure spatial Gaussian blur
    ///
    /// # Errors
    ///
    /// * `BilateralFilterError::InvalidSpatialSigma` - When `spatial_sigma` is not finite and positive
    /// * `BilateralFilterError::InvalidRangeSigma` - When `range_sigma` is not positive
    /// * `BilateralFilterError::DimensionMismatch` - When mask and guide differ in size
    /// * `BilateralFilterError::EmptyImage` - When the images have zero area
    fn bilateral_filter(
        &self,
        guide: &Image<Rgba<u8>>,
        spatial_sigma: f32,
        range_sigma: f32,
    ) -> Result<Image<Luma<u8>>, BilateralFilterError>;
}

impl BilateralFilterExt for Image<Luma<u8>> {
    fn bilateral_filter(
        &self,
        guide: &Image<Rgba<u8>>,
        spatial_sigma: f32,
        range_sigma: f32,
    ) -> Result<Image<Luma<u8>>, BilateralFilterError> {
        validate_inputs(self, guide, spatial_sigma, range_sigma)?;

        let (width, height) = self.dimensions();
        // Taps further out than the image never land inside it
        let radius = i64::from(window_radius(spatial_sigma).min(width.max(height)));
        if spatial_sigma > LARGE_SPATIAL_SIGMA {
            warn!(
                "bilateral filter with spatial sigma {spatial_sigma} uses a {0}x{0} window per pixel",
                2 * radius + 1
            );
        }
        let spatial_denominator = 2.0 * spatial_sigma * spatial_sigma;
        // Channels are normalized to [0, 1], so squared distances scale by 1/255².
        // f64 keeps the coefficient finite for tiny sigmas; an infinite sigma gives 0.
        let range_coefficient = 0.5 / (255.0 * f64::from(range_sigma)).powi(2);

        // Spatial weights only depend on the offset
        let side = (2 * radius + 1) as usize;
        let spatial_weights: Vec<f32> = (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
            .map(|(dx, dy)| (-((dx * dx + dy * dy) as f32) / spatial_denominator).exp())
            .collect();

        let guide_raw = guide.as_raw();
        let mask_raw = self.as_raw();
        let (w, h) = (i64::from(width), i64::from(height));

        let mut output = vec![0u8; mask_raw.len()];
        fill_rows(&mut output, width as usize, |y, row| {
            let y = y as i64;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as i64;
                let center_idx = (y * w + x) as usize;
                let center = &guide_raw[center_idx * 4..center_idx * 4 + 4];

                let mut weight_sum = 0.0f32;
                let mut value_sum = 0.0f32;

                for dy in -radius..=radius {
                    let ny = y + dy;
                    if ny < 0 || ny >= h {
                        continue;
                    }
                    for dx in -radius..=radius {
                        let nx = x + dx;
                        if nx < 0 || nx >= w {
                            continue;
                        }
                        let n_idx = (ny * w + nx) as usize;
                        let neighbor = &guide_raw[n_idx * 4..n_idx * 4 + 4];

                        let spatial = spatial_weights[(dy + radius) as usize * side + (dx + radius) as usize];
                        let range =
                            (-f64::from(rgb_distance_squared(center, neighbor)) * range_coefficient).exp() as f32;
                        let weight = spatial * range;

                        weight_sum += weight;
                        value_sum += weight * f32::from(mask_raw[n_idx]);
                    }
                }

                *out = if weight_sum > 0.0 {
                    round_to_u8(value_sum / weight_sum)
                } else {
                    mask_raw[center_idx]
                };
            }
        });

        Image::from_raw(width, height, output).ok_or(BilateralFilterError::EmptyImage)
    }
}

/// Window radius `ceil(2 * sigma)` used for a given spatial sigma
pub fn window_radius(spatial_sigma: f32) -> u32 {
    (2.0 * spatial_sigma).ceil() as u32
}

fn validate_inputs(
    mask: &Image<Luma<u8>>,
    guide: &Image<Rgba<u8>>,
    spatial_sigma: f32,
    range_sigma: f32,
) -> Result<(), BilateralFilterError> {
    if !(spatial_sigma.is_finite() && spatial_sigma > 0.0) {
        return Err(BilateralFilterError::InvalidSpatialSigma {
            sigma: spatial_sigma,
        });
    }
    if !(range_sigma > 0.0) {
        return Err(BilateralFilterError::InvalidRangeSigma { sigma: range_sigma });
    }

    let mask_dims = mask.dimensions();
    let guide_dims = guide.dimensions();
    if mask_dims.0 == 0 || mask_dims.1 == 0 || guide_dims.0 == 0 || guide_dims.1 == 0 {
        return Err(BilateralFilterError::EmptyImage);
    }
    if mask_dims != guide_dims {
        return Err(BilateralFilterError::DimensionMismatch {
            guide_dims,
            mask_dims,
        });
    }
    Ok(())
}
