use crate::error::AlphaMaskError;
use crate::utils::{
    fill_rows, normalize_alpha_with_max, round_to_u8, validate_matching_dimensions,
    validate_non_empty_image,
};
use image::{Luma, Rgba};
use imageproc::definitions::Image;

/// Default blend strength of [`defringe`]
pub const DEFAULT_DEFRINGE_STRENGTH: f32 = 0.8;

/// Edge band processed by the defringer, exclusive bounds
const EDGE_BAND: (u8, u8) = (10, 245);
/// Neighbors must be at least this opaque to donate their color
const OPAQUE_THRESHOLD: u8 = 200;
const SEARCH_RADIUS: i64 = 4;

/// Pulls semi-transparent edge colors toward nearby opaque foreground colors
///
/// For every pixel whose matte alpha lies strictly between 10 and 245, the
/// colors of neighbors within radius 4 whose matte alpha exceeds 200 are
/// averaged with weight `exp(-distance / 2) * alpha / 255`, and the pixel is
/// blended toward that average by `strength * (1 - alpha / 255)`. Neighbors
/// are always read from the unmodified input.
///
/// Only RGB changes; the alpha channel of `image` is copied as is. Pixels
/// outside the edge band, or with no opaque neighbor, are byte-identical to
/// the input.
///
/// # Errors
///
/// * `AlphaMaskError::InvalidParameter` - When `strength` is outside `[0, 1]`
/// * `AlphaMaskError::DimensionMismatch` - When image and alpha sizes differ
/// * `AlphaMaskError::EmptyImage` - When the image has zero area
pub fn defringe(
    image: &Image<Rgba<u8>>,
    alpha: &Image<Luma<u8>>,
    strength: f32,
) -> Result<Image<Rgba<u8>>, AlphaMaskError> {
    if !(0.0..=1.0).contains(&strength) {
        return Err(AlphaMaskError::InvalidParameter(format!(
            "defringe strength must be within [0, 1], got {strength}"
        )));
    }
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height, "image")?;
    validate_matching_dimensions((width, height), alpha.dimensions())?;

    let src = image.as_raw();
    let matte = alpha.as_raw();
    let (w, h) = (i64::from(width), i64::from(height));

    let mut output = src.clone();
    fill_rows(&mut output, width as usize * 4, |y, row| {
        let y = y as i64;
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let x = x as i64;
            let a = matte[(y * w + x) as usize];
            if a <= EDGE_BAND.0 || a >= EDGE_BAND.1 {
                continue;
            }

            let mut sum = [0.0f32; 3];
            let mut total = 0.0f32;
            for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
                let ny = y + dy;
                if ny < 0 || ny >= h {
                    continue;
                }
                for dx in -SEARCH_RADIUS..=SEARCH_RADIUS {
                    let nx = x + dx;
                    if nx < 0 || nx >= w {
                        continue;
                    }
                    let n_idx = (ny * w + nx) as usize;
                    let n_alpha = matte[n_idx];
                    if n_alpha <= OPAQUE_THRESHOLD {
                        continue;
                    }
                    let distance = ((dx * dx + dy * dy) as f32).sqrt();
                    let weight = (-distance / 2.0).exp() * normalize_alpha_with_max(n_alpha, 255.0);
                    let neighbor = &src[n_idx * 4..n_idx * 4 + 3];
                    for (acc, &c) in sum.iter_mut().zip(neighbor) {
                        *acc += weight * f32::from(c);
                    }
                    total += weight;
                }
            }
            if total <= 0.0 {
                continue;
            }

            let blend = strength * (1.0 - normalize_alpha_with_max(a, 255.0));
            for (channel, acc) in pixel.iter_mut().zip(sum) {
                let average = acc / total;
                *channel = round_to_u8(f32::from(*channel) * (1.0 - blend) + average * blend);
            }
        }
    });

    Image::from_raw(width, height, output).ok_or(AlphaMaskError::EmptyImage("image"))
}
