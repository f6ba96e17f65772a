//! Morphological cleanup of alpha mattes.
//!
//! A grayscale closing fills small holes and cracks in the subject, then a
//! grayscale opening removes small isolated specks from the background.

use crate::error::AlphaMaskError;
use crate::utils::validate_non_empty_image;
use image::Luma;
use imageproc::definitions::Image;
use imageproc::morphology::{grayscale_close, grayscale_open, Mask};

/// Radii of the square structuring elements used by [`clean_mask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskCleanup {
    /// Closing radius; holes up to `2 * close_radius` pixels wide are filled.
    /// `0` skips the closing
    pub close_radius: u8,
    /// Opening radius; specks that do not contain a
    /// `(2 * open_radius + 1)²` square are removed. `0` skips the opening
    pub open_radius: u8,
}

impl Default for MaskCleanup {
    fn default() -> Self {
        Self {
            close_radius: 2,
            open_radius: 1,
        }
    }
}

/// Fills small holes and removes small specks from an alpha matte
///
/// Works on soft mattes as well: closing takes the local maximum then the
/// local minimum, opening the reverse. Taps outside the image are ignored.
///
/// # Errors
///
/// * `AlphaMaskError::EmptyImage` - When the matte has zero area
///
/// # Examples
///
/// ```
/// use image::Luma;
/// use imageops_matte::{clean_mask, Image, MaskCleanup};
///
/// // A single stray pixel on an empty background
/// let matte: Image<Luma<u8>> = Image::from_fn(7, 7, |x, y| Luma([if (x, y) == (3, 3) { 255 } else { 0 }]));
/// let cleaned = clean_mask(&matte, MaskCleanup::default()).unwrap();
/// assert!(cleaned.pixels().all(|p| p[0] == 0));
/// ```
pub fn clean_mask(
    mask: &Image<Luma<u8>>,
    cleanup: MaskCleanup,
) -> Result<Image<Luma<u8>>, AlphaMaskError> {
    let (width, height) = mask.dimensions();
    validate_non_empty_image(width, height, "alpha")?;

    let closed = match cleanup.close_radius {
        0 => mask.clone(),
        radius => grayscale_close(mask, &Mask::square(radius)),
    };
    Ok(match cleanup.open_radius {
        0 => closed,
        radius => grayscale_open(&closed, &Mask::square(radius)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_rect_mask;

    #[test]
    fn test_fills_hole_and_removes_speck() {
        let clean = create_rect_mask(36, 36, (12, 12, 28, 28), 255, 0);
        let mut noisy = clean.clone();
        // 3x3 hole inside the subject
        for (x, y) in itertools::iproduct!(18..21, 18..21) {
            noisy.put_pixel(x, y, Luma([0]));
        }
        // 2x2 speck in the background
        for (x, y) in itertools::iproduct!(4..6, 4..6) {
            noisy.put_pixel(x, y, Luma([255]));
        }

        let cleaned = clean_mask(&noisy, MaskCleanup::default()).unwrap();
        assert_eq!(cleaned, clean);
    }

    #[test]
    fn test_clean_rectangle_is_unchanged() {
        let mask = create_rect_mask(20, 16, (5, 4, 15, 12), 255, 0);
        assert_eq!(clean_mask(&mask, MaskCleanup::default()).unwrap(), mask);
    }

    #[test]
    fn test_zero_radii_is_identity() {
        let mask = Image::from_fn(9, 7, |x, y| Luma([((x * 37 + y * 91) % 256) as u8]));
        let cleanup = MaskCleanup {
            close_radius: 0,
            open_radius: 0,
        };
        assert_eq!(clean_mask(&mask, cleanup).unwrap(), mask);
    }

    #[test]
    fn test_soft_crack_is_closed() {
        // One-pixel crack of partial alpha through an opaque block
        let mask = Image::from_fn(15, 15, |x, y| {
            let inside = (3..12).contains(&x) && (3..12).contains(&y);
            Luma([match (inside, x == 7) {
                (true, true) => 90,
                (true, false) => 255,
                _ => 0,
            }])
        });
        let expected = create_rect_mask(15, 15, (3, 3, 12, 12), 255, 0);

        let cleaned = clean_mask(&mask, MaskCleanup::default()).unwrap();
        assert_eq!(cleaned, expected);
    }

    #[test]
    fn test_empty_matte() {
        let mask: Image<Luma<u8>> = Image::new(0, 4);
        assert_eq!(
            clean_mask(&mask, MaskCleanup::default()),
            Err(AlphaMaskError::EmptyImage("alpha"))
        );
    }
}
