//! Test utilities for imageops-matte
//!
//! This module provides common functionality for testing matting stages.
//! It is only compiled when running tests.

use image::{Luma, Rgba};
use imageproc::definitions::Image;

/// Creates an RGBA image filled with a single opaque color.
pub fn create_solid_image(width: u32, height: u32, rgb: [u8; 3]) -> Image<Rgba<u8>> {
    Image::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Creates an RGBA image with a `fg` rectangle `[x0, x1) x [y0, y1)` over a `bg` fill.
pub fn create_rect_image(
    width: u32,
    height: u32,
    rect: (u32, u32, u32, u32),
    fg: [u8; 3],
    bg: [u8; 3],
) -> Image<Rgba<u8>> {
    let (x0, y0, x1, y1) = rect;
    Image::from_fn(width, height, |x, y| {
        let [r, g, b] = if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            fg
        } else {
            bg
        };
        Rgba([r, g, b, 255])
    })
}

/// Creates a mask with `inside` in the rectangle `[x0, x1) x [y0, y1)` and `outside` elsewhere.
pub fn create_rect_mask(
    width: u32,
    height: u32,
    rect: (u32, u32, u32, u32),
    inside: u8,
    outside: u8,
) -> Image<Luma<u8>> {
    let (x0, y0, x1, y1) = rect;
    Image::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            Luma([inside])
        } else {
            Luma([outside])
        }
    })
}

/// Creates a 2x2 test alpha mask with varying transparency levels:
/// - (0,0): [255] (fully opaque)
/// - (1,0): [192] (mostly opaque)
/// - (0,1): [128] (semi-transparent)
/// - (1,1): [64]  (mostly transparent)
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    let mut mask: Image<Luma<u8>> = Image::new(2, 2);
    mask.put_pixel(0, 0, Luma([255]));
    mask.put_pixel(1, 0, Luma([192]));
    mask.put_pixel(0, 1, Luma([128]));
    mask.put_pixel(1, 1, Luma([64]));
    mask
}

/// Compares two masks with a tolerance, in levels.
///
/// # Returns
/// `true` if dimensions match and every value is within `tolerance`
pub fn masks_approx_equal(expected: &Image<Luma<u8>>, actual: &Image<Luma<u8>>, tolerance: u8) -> bool {
    expected.dimensions() == actual.dimensions()
        && expected
            .as_raw()
            .iter()
            .zip(actual.as_raw())
            .all(|(e, a)| e.abs_diff(*a) <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rect_image_with_valid_input_creates_image() {
        let image = create_rect_image(4, 4, (1, 1, 3, 3), [255, 0, 0], [0, 0, 255]);
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn create_rect_mask_with_valid_input_creates_mask() {
        let mask = create_rect_mask(3, 3, (1, 1, 2, 2), 255, 0);
        assert_eq!(mask.as_raw(), &vec![0, 0, 0, 0, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn masks_approx_equal_with_tolerant_comparison_returns_true() {
        let mask1 = create_test_alpha_mask();
        let mut mask2 = create_test_alpha_mask();
        mask2.put_pixel(1, 1, Luma([65]));

        assert!(masks_approx_equal(&mask1, &mask2, 1));
        assert!(!masks_approx_equal(&mask1, &mask2, 0));
    }
}
