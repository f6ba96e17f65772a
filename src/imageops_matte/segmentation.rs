//! Seeding a trimap from an external foreground probability model.
//!
//! The model itself is a black box behind [`SegmentationModel`]; this module
//! only normalizes its output, brings it to the image resolution and
//! thresholds it.

use std::error::Error;

use crate::error::SegmentationError;
use crate::imageops_matte::trimap::trimap_from_probability;
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use itertools::{Itertools, MinMaxResult};
use log::trace;

/// A foreground probability model
///
/// Implementations run inference on an RGBA image and return a probability
/// mask at any resolution, with larger values meaning "more foreground".
/// Values do not need to be normalized.
pub trait SegmentationModel {
    fn predict(
        &mut self,
        image: &Image<Rgba<u8>>,
    ) -> Result<Image<Luma<f32>>, Box<dyn Error + Send + Sync>>;
}

impl<F> SegmentationModel for F
where
    F: FnMut(&Image<Rgba<u8>>) -> Result<Image<Luma<f32>>, Box<dyn Error + Send + Sync>>,
{
    fn predict(
        &mut self,
        image: &Image<Rgba<u8>>,
    ) -> Result<Image<Luma<f32>>, Box<dyn Error + Send + Sync>> {
        self(image)
    }
}

/// Min-max normalizes a probability mask to `[0, 1]`
///
/// A constant mask has no range to stretch and is clamped to `[0, 1]`
/// instead.
///
/// # Errors
///
/// * `SegmentationError::EmptyImage` - When the mask has zero area
/// * `SegmentationError::NonFiniteProbability` - When the mask holds NaN or infinity
pub fn normalize_probability(
    probability: &Image<Luma<f32>>,
) -> Result<Image<Luma<f32>>, SegmentationError> {
    let (width, height) = probability.dimensions();
    let raw = probability.as_raw();
    if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
        return Err(SegmentationError::NonFiniteProbability { index });
    }

    let normalized: Vec<f32> = match raw.iter().copied().minmax() {
        MinMaxResult::NoElements => {
            return Err(SegmentationError::EmptyImage {
                buffer: "probability mask",
            })
        }
        MinMaxResult::OneElement(v) => vec![v.clamp(0.0, 1.0)],
        MinMaxResult::MinMax(min, max) if max > min => {
            let range = max - min;
            raw.iter().map(|&v| (v - min) / range).collect()
        }
        MinMaxResult::MinMax(..) => raw.iter().map(|&v| v.clamp(0.0, 1.0)).collect(),
    };

    Image::from_raw(width, height, normalized).ok_or(SegmentationError::EmptyImage {
        buffer: "probability mask",
    })
}

/// Resizes a probability mask with nearest-neighbour sampling
///
/// Target pixel `(x, y)` reads source pixel
/// `(x * src_width / width, y * src_height / height)`. Values are copied
/// untouched, so unnormalized scores keep their range.
///
/// # Errors
///
/// * `SegmentationError::EmptyImage` - When the source or target size has zero area
pub fn resize_mask(
    mask: &Image<Luma<f32>>,
    width: u32,
    height: u32,
) -> Result<Image<Luma<f32>>, SegmentationError> {
    let (src_w, src_h) = mask.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(SegmentationError::EmptyImage {
            buffer: "probability mask",
        });
    }
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage { buffer: "image" });
    }
    if (src_w, src_h) == (width, height) {
        return Ok(mask.clone());
    }
    let scale = |dst: u32, src_len: u32, dst_len: u32| {
        (u64::from(dst) * u64::from(src_len) / u64::from(dst_len)) as u32
    };
    Ok(Image::from_fn(width, height, |x, y| {
        *mask.get_pixel(scale(x, src_w, width), scale(y, src_h, height))
    }))
}

/// Normalizes, resizes and thresholds a model output into a trimap for an image of `width` x `height`
///
/// # Examples
///
/// ```
/// use image::Luma;
/// use imageops_matte::{probability_to_trimap, Image};
///
/// // Raw logits at half resolution
/// let logits: Image<Luma<f32>> = Image::from_fn(2, 1, |x, _| Luma([[-4.0, 4.0][x as usize]]));
/// let trimap = probability_to_trimap(&logits, 4, 2, (0.15, 0.85)).unwrap();
/// assert_eq!(trimap.dimensions(), (4, 2));
/// assert_eq!(trimap.as_raw(), &vec![0, 0, 255, 255, 0, 0, 255, 255]);
/// ```
pub fn probability_to_trimap(
    probability: &Image<Luma<f32>>,
    width: u32,
    height: u32,
    thresholds: (f32, f32),
) -> Result<Image<Luma<u8>>, SegmentationError> {
    let normalized = normalize_probability(probability)?;
    let resized = resize_mask(&normalized, width, height)?;
    trace!(
        "probability mask {:?} resized to {width}x{height}",
        probability.dimensions()
    );
    trimap_from_probability(&resized, thresholds.0, thresholds.1)
}
