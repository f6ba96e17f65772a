use image::{Luma, Rgba};
use imageproc::definitions::Image;

use crate::error::BufferError;

/// Wraps a decoded, interleaved RGBA byte buffer as an image.
///
/// The buffer must hold exactly `width * height * 4` bytes in row-major order.
///
/// # Errors
///
/// * `BufferError::EmptyImage` - When width or height is zero
/// * `BufferError::LengthMismatch` - When the buffer length does not match the dimensions
///
/// # Examples
///
/// ```
/// use imageops_matte::rgba_image_from_raw;
///
/// let image = rgba_image_from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
/// assert_eq!(image.dimensions(), (2, 1));
/// assert!(rgba_image_from_raw(2, 2, vec![0; 8]).is_err());
/// ```
pub fn rgba_image_from_raw(
    width: u32,
    height: u32,
    data: Vec<u8>,
) -> Result<Image<Rgba<u8>>, BufferError> {
    from_raw(width, height, 4, data, "RGBA image")
}

/// Wraps a single-channel byte buffer of length `width * height` as a mask.
///
/// # Errors
///
/// * `BufferError::EmptyImage` - When width or height is zero
/// * `BufferError::LengthMismatch` - When the buffer length does not match the dimensions
pub fn mask_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Image<Luma<u8>>, BufferError> {
    from_raw(width, height, 1, data, "mask")
}

fn from_raw<P>(
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
    buffer: &'static str,
) -> Result<Image<P>, BufferError>
where
    P: image::Pixel<Subpixel = u8>,
{
    if width == 0 || height == 0 {
        return Err(BufferError::EmptyImage {
            buffer,
            width,
            height,
        });
    }

    let expected = width as usize * height as usize * channels;
    let actual = data.len();
    if actual != expected {
        return Err(BufferError::LengthMismatch {
            buffer,
            width,
            height,
            expected,
            actual,
        });
    }

    Image::from_raw(width, height, data).ok_or(BufferError::LengthMismatch {
        buffer,
        width,
        height,
        expected,
        actual,
    })
}
