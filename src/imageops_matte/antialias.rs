use crate::error::AlphaMaskError;
use crate::utils::{fill_rows, round_to_u8};
use image::Luma;
use imageproc::definitions::Image;

/// 3x3 binomial kernel, row-major
const KERNEL: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

/// Smooths the edge band of an alpha matte with a 3x3 binomial kernel
///
/// Only values strictly between 5 and 250 are filtered; everything else is
/// copied. Taps outside the image are skipped and the result renormalized by
/// the weights actually used, so the output never leaves the range of its
/// neighborhood.
///
/// # Errors
///
/// * `AlphaMaskError::EmptyImage` - When the matte has zero area
///
/// # Examples
///
/// ```
/// use image::Luma;
/// use imageops_matte::{antialias, Image};
///
/// let alpha: Image<Luma<u8>> = Image::from_fn(3, 1, |x, _| Luma([[0, 100, 255][x as usize]]));
/// let smoothed = antialias(&alpha).unwrap();
/// // (0*2 + 100*4 + 255*2) / 8
/// assert_eq!(smoothed.as_raw(), &vec![0, 114, 255]);
/// ```
pub fn antialias(alpha: &Image<Luma<u8>>) -> Result<Image<Luma<u8>>, AlphaMaskError> {
    let (width, height) = alpha.dimensions();
    if width == 0 || height == 0 {
        return Err(AlphaMaskError::EmptyImage("alpha"));
    }

    let src = alpha.as_raw();
    let (w, h) = (width as usize, height as usize);

    let mut output = src.clone();
    fill_rows(&mut output, w, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            if *out <= 5 || *out >= 250 {
                continue;
            }
            let mut sum = 0.0f32;
            let mut weights = 0.0f32;
            for (ky, kernel_row) in KERNEL.iter().enumerate() {
                let Some(ny) = (y + ky).checked_sub(1).filter(|&ny| ny < h) else {
                    continue;
                };
                for (kx, &k) in kernel_row.iter().enumerate() {
                    let Some(nx) = (x + kx).checked_sub(1).filter(|&nx| nx < w) else {
                        continue;
                    };
                    sum += k * f32::from(src[ny * w + nx]);
                    weights += k;
                }
            }
            *out = round_to_u8(sum / weights);
        }
    });

    Image::from_raw(width, height, output).ok_or(AlphaMaskError::EmptyImage("alpha"))
}
