use crate::error::AlphaMaskError;
use crate::imageops_matte::trimap::{count_unknown, is_unknown, BACKGROUND, FOREGROUND};
use crate::utils::{fill_rows, rgb_distance, round_to_u8, validate_matching_dimensions, validate_non_empty_image};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use log::trace;

/// Window sizes for [`refine_matte`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefineOptions {
    /// Initial half-width of the square search window
    pub radius: u32,
    /// Largest half-width the window may grow to when it holds no known pixel
    ///
    /// Equal to `radius` disables growth.
    pub max_radius: u32,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            radius: 3,
            max_radius: 3,
        }
    }
}

impl RefineOptions {
    /// Fixed window of half-width `radius`
    pub const fn fixed(radius: u32) -> Self {
        Self {
            radius,
            max_radius: radius,
        }
    }

    /// Window starting at `radius` and doubling up to `max_radius`
    pub const fn adaptive(radius: u32, max_radius: u32) -> Self {
        Self { radius, max_radius }
    }
}

/// Resolves the unknown pixels of a trimap into continuous alpha
///
/// Every unknown pixel looks at the definite foreground and background
/// pixels in its window and weights each by `1 / (1 + d)`, where `d` is the
/// RGB distance to the center color. The alpha is the foreground share of
/// the total weight. When the window holds no known pixel the radius is
/// doubled until `max_radius`; if that still finds nothing the trimap value
/// is kept.
///
/// Definite pixels are copied, so a trimap without unknown pixels is
/// returned unchanged.
///
/// # Errors
///
/// * `AlphaMaskError::DimensionMismatch` - When image and trimap sizes differ
/// * `AlphaMaskError::EmptyImage` - When the image has zero area
/// * `AlphaMaskError::InvalidParameter` - When `max_radius < radius`
///
/// # Examples
///
/// ```
/// use image::{Luma, Rgba};
/// use imageops_matte::{refine_matte, Image, RefineOptions};
///
/// let image: Image<Rgba<u8>> = Image::from_fn(3, 1, |x, _| {
///     Rgba([[255, 255, 0][x as usize], 0, 0, 255])
/// });
/// let trimap: Image<Luma<u8>> = Image::from_fn(3, 1, |x, _| Luma([[255, 128, 0][x as usize]]));
///
/// let alpha = refine_matte(&image, &trimap, RefineOptions::default()).unwrap();
/// // The unknown pixel matches the foreground color exactly
/// assert!(alpha.get_pixel(1, 0)[0] > 250);
/// ```
pub fn refine_matte(
    image: &Image<Rgba<u8>>,
    trimap: &Image<Luma<u8>>,
    options: RefineOptions,
) -> Result<Image<Luma<u8>>, AlphaMaskError> {
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height, "image")?;
    validate_matching_dimensions((width, height), trimap.dimensions())?;
    if options.max_radius < options.radius {
        return Err(AlphaMaskError::InvalidParameter(format!(
            "max_radius ({}) must not be smaller than radius ({})",
            options.max_radius, options.radius
        )));
    }

    let unknown = count_unknown(trimap);
    trace!("refining {unknown} unknown pixels of {width}x{height}");
    if unknown == 0 {
        return Ok(trimap.clone());
    }

    let pixels = image.as_raw();
    let labels = trimap.as_raw();
    let mut output = labels.clone();
    fill_rows(&mut output, width as usize, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            if !is_unknown(*out) {
                continue;
            }
            let mut radius = options.radius;
            loop {
                let (fg, bg) = window_weights(pixels, labels, width, height, x as u32, y as u32, radius);
                let total = fg + bg;
                if total > 0.0 {
                    *out = round_to_u8(255.0 * fg / total);
                    break;
                }
                if radius >= options.max_radius {
                    break;
                }
                radius = radius.saturating_mul(2).max(1).min(options.max_radius);
            }
        }
    });

    Image::from_raw(width, height, output).ok_or(AlphaMaskError::EmptyImage("image"))
}

/// Foreground and background weight sums of the window around `(x, y)`
fn window_weights(
    pixels: &[u8],
    labels: &[u8],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    radius: u32,
) -> (f32, f32) {
    let center_idx = (y * width + x) as usize * 4;
    let center = &pixels[center_idx..center_idx + 4];

    let x_range = x.saturating_sub(radius)..=x.saturating_add(radius).min(width - 1);
    let y_range = y.saturating_sub(radius)..=y.saturating_add(radius).min(height - 1);

    let mut fg = 0.0f32;
    let mut bg = 0.0f32;
    for ny in y_range {
        for nx in x_range.clone() {
            let n_idx = (ny * width + nx) as usize;
            let label = labels[n_idx];
            if label != FOREGROUND && label != BACKGROUND {
                continue;
            }
            let weight = 1.0 / (1.0 + rgb_distance(center, &pixels[n_idx * 4..n_idx * 4 + 4]));
            if label == FOREGROUND {
                fg += weight;
            } else {
                bg += weight;
            }
        }
    }
    (fg, bg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imageops_matte::trimap::UNKNOWN;
    use crate::test_utils::{create_rect_image, create_rect_mask, create_solid_image};

    #[test]
    fn test_no_unknown_pixels_is_identity() {
        let image = create_rect_image(8, 8, (2, 2, 6, 6), [255, 0, 0], [0, 0, 255]);
        let trimap = create_rect_mask(8, 8, (2, 2, 6, 6), FOREGROUND, BACKGROUND);

        let alpha = refine_matte(&image, &trimap, RefineOptions::default()).unwrap();
        assert_eq!(alpha, trimap);
    }

    #[test]
    fn test_only_foreground_in_window() {
        let image = create_solid_image(7, 7, [10, 20, 30]);
        let mut trimap = Image::from_pixel(7, 7, Luma([FOREGROUND]));
        trimap.put_pixel(3, 3, Luma([UNKNOWN]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::default()).unwrap();
        assert_eq!(alpha.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn test_only_background_in_window() {
        let image = create_solid_image(7, 7, [10, 20, 30]);
        let mut trimap = Image::from_pixel(7, 7, Luma([BACKGROUND]));
        trimap.put_pixel(3, 3, Luma([77]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::default()).unwrap();
        assert_eq!(alpha.get_pixel(3, 3)[0], 0);
    }

    #[test]
    fn test_equal_support_gives_half() {
        // One foreground and one background neighbor, both at the same color distance
        let image = create_solid_image(3, 1, [100, 100, 100]);
        let trimap = Image::from_fn(3, 1, |x, _| Luma([[FOREGROUND, UNKNOWN, BACKGROUND][x as usize]]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::fixed(1)).unwrap();
        assert_eq!(alpha.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_color_similarity_drives_alpha() {
        let image = Image::from_fn(3, 1, |x, _| {
            Rgba(match x {
                0 => [250, 0, 0, 255],
                1 => [240, 10, 0, 255],
                _ => [0, 0, 250, 255],
            })
        });
        let trimap = Image::from_fn(3, 1, |x, _| Luma([[FOREGROUND, UNKNOWN, BACKGROUND][x as usize]]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::fixed(1)).unwrap();
        let value = alpha.get_pixel(1, 0)[0];
        assert!(value > 240, "alpha {value}");
    }

    #[test]
    fn test_unsupported_pixel_keeps_trimap_value() {
        let image = create_solid_image(9, 1, [0, 0, 0]);
        let trimap = Image::from_fn(9, 1, |x, _| Luma([if x == 0 { FOREGROUND } else { 100 }]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::fixed(2)).unwrap();
        assert_eq!(alpha.get_pixel(8, 0)[0], 100);
        assert_eq!(alpha.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_adaptive_growth_reaches_far_support() {
        let image = create_solid_image(9, 1, [0, 0, 0]);
        let trimap = Image::from_fn(9, 1, |x, _| Luma([if x == 0 { FOREGROUND } else { UNKNOWN }]));

        // 8 pixels away: radius 1 -> 2 -> 4 -> 8
        let alpha = refine_matte(&image, &trimap, RefineOptions::adaptive(1, 8)).unwrap();
        assert!(alpha.as_raw().iter().all(|&v| v == 255));

        let capped = refine_matte(&image, &trimap, RefineOptions::adaptive(1, 6)).unwrap();
        assert_eq!(capped.get_pixel(6, 0)[0], 255);
        assert_eq!(capped.get_pixel(7, 0)[0], UNKNOWN);
    }

    #[test]
    fn test_zero_radius_growth() {
        let image = create_solid_image(3, 1, [0, 0, 0]);
        let trimap = Image::from_fn(3, 1, |x, _| Luma([[BACKGROUND, UNKNOWN, UNKNOWN][x as usize]]));

        let alpha = refine_matte(&image, &trimap, RefineOptions::adaptive(0, 2)).unwrap();
        assert_eq!(alpha.as_raw(), &vec![0, 0, 0]);
    }

    #[test]
    fn test_errors() {
        let image = create_solid_image(4, 4, [0, 0, 0]);
        let trimap: Image<Luma<u8>> = Image::new(4, 3);
        assert_eq!(
            refine_matte(&image, &trimap, RefineOptions::default()),
            Err(AlphaMaskError::DimensionMismatch {
                expected: (4, 4),
                actual: (4, 3),
            })
        );

        let trimap: Image<Luma<u8>> = Image::new(4, 4);
        assert!(matches!(
            refine_matte(&image, &trimap, RefineOptions::adaptive(4, 2)),
            Err(AlphaMaskError::InvalidParameter(_))
        ));

        let empty: Image<Rgba<u8>> = Image::new(0, 0);
        let empty_trimap: Image<Luma<u8>> = Image::new(0, 0);
        assert_eq!(
            refine_matte(&empty, &empty_trimap, RefineOptions::default()),
            Err(AlphaMaskError::EmptyImage("image"))
        );
    }
}
