use crate::error::SegmentationError;
use image::{Rgb, Rgba};
use imageproc::definitions::Image;

/// A representative background color
pub type ColorSample = Rgb<u8>;

/// Number of samples taken along each border by default
pub const DEFAULT_SAMPLES_PER_EDGE: u32 = 20;

/// Samples background colors evenly along the four image borders
///
/// For every index `i` in `0..samples_per_edge` the positions
/// `floor(i * width / n)` on the top and bottom rows and
/// `floor(i * height / n)` on the left and right columns are read, so the
/// result holds `4 * samples_per_edge` colors. Corners and small images
/// produce duplicates, which are kept.
///
/// # Errors
///
/// * `SegmentationError::InvalidSampleCount` - When `samples_per_edge` is 0
/// * `SegmentationError::EmptyImage` - When the image has zero area
///
/// # Examples
///
/// ```
/// use image::{Rgb, Rgba};
/// use imageops_matte::{sample_border_colors, Image};
///
/// let image: Image<Rgba<u8>> = Image::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
/// let samples = sample_border_colors(&image, 5).unwrap();
/// assert_eq!(samples.len(), 20);
/// assert!(samples.iter().all(|s| *s == Rgb([0, 0, 255])));
/// ```
pub fn sample_border_colors(
    image: &Image<Rgba<u8>>,
    samples_per_edge: u32,
) -> Result<Vec<ColorSample>, SegmentationError> {
    if samples_per_edge == 0 {
        return Err(SegmentationError::InvalidSampleCount {
            samples: samples_per_edge,
        });
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage { buffer: "image" });
    }

    let rgb = |x: u32, y: u32| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        Rgb([r, g, b])
    };

    let mut samples = Vec::with_capacity(4 * samples_per_edge as usize);
    for i in 0..samples_per_edge {
        let x = edge_position(i, samples_per_edge, width);
        samples.push(rgb(x, 0));
        samples.push(rgb(x, height - 1));
    }
    for i in 0..samples_per_edge {
        let y = edge_position(i, samples_per_edge, height);
        samples.push(rgb(0, y));
        samples.push(rgb(width - 1, y));
    }

    Ok(samples)
}

/// `floor(i / n * dimension)` clamped to the last valid index
#[inline]
fn edge_position(i: u32, n: u32, dimension: u32) -> u32 {
    let position = u64::from(i) * u64::from(dimension) / u64::from(n);
    (position as u32).min(dimension - 1)
}
