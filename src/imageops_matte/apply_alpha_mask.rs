use image::{Luma, Rgba};
use imageproc::{definitions::Image, map::map_colors2};

use crate::{error::AlphaMaskError, utils::validate_matching_dimensions};

/// Replaces the alpha channel of an RGBA image with a refined matte
///
/// Color channels are left as they are, so a defringed color image and its
/// matte combine into the final cutout.
pub trait ModifyAlpha {
    /// Replaces the alpha channel with `matte`, consuming the image
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and matte dimensions don't match
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{Luma, Rgba};
    /// use imageops_matte::{Image, ModifyAlpha};
    ///
    /// let image: Image<Rgba<u8>> = Image::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
    /// let matte: Image<Luma<u8>> = Image::from_pixel(2, 2, Luma([64]));
    ///
    /// let cutout = image.replace_alpha(&matte).unwrap();
    /// assert_eq!(cutout.get_pixel(1, 1), &Rgba([10, 20, 30, 64]));
    /// ```
    fn replace_alpha(self, matte: &Image<Luma<u8>>) -> Result<Self, AlphaMaskError>
    where
        Self: Sized;

    /// Replaces the alpha channel with `matte` in place
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and matte dimensions don't match
    fn replace_alpha_mut(&mut self, matte: &Image<Luma<u8>>) -> Result<&mut Self, AlphaMaskError>;
}

impl ModifyAlpha for Image<Rgba<u8>> {
    fn replace_alpha(self, matte: &Image<Luma<u8>>) -> Result<Self, AlphaMaskError> {
        validate_dimensions(&self, matte)?;

        Ok(map_colors2(&self, matte, |Rgba([red, green, blue, _]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        }))
    }

    fn replace_alpha_mut(&mut self, matte: &Image<Luma<u8>>) -> Result<&mut Self, AlphaMaskError> {
        validate_dimensions(self, matte)?;

        self.pixels_mut()
            .zip(matte.pixels())
            .for_each(|(pixel, Luma([alpha]))| pixel[3] = *alpha);

        Ok(self)
    }
}

#[inline]
fn validate_dimensions(image: &Image<Rgba<u8>>, matte: &Image<Luma<u8>>) -> Result<(), AlphaMaskError> {
    validate_matching_dimensions(image.dimensions(), matte.dimensions())
}
