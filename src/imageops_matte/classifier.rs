use crate::error::SegmentationError;
use crate::imageops_matte::color_sampler::{sample_border_colors, ColorSample};
use crate::imageops_matte::trimap::{BACKGROUND, FOREGROUND, UNKNOWN};
use crate::utils::{fill_rows, rgb_distance_squared, MAX_RGB_DISTANCE};
use image::{Luma, Rgba};
use imageproc::definitions::Image;

/// Options for [`classify`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierOptions {
    /// Normalized distance threshold on a `0..=100` scale
    pub tolerance: f32,
    /// Half-width of the band around `tolerance` labeled unknown
    ///
    /// `None` reproduces the strictly binary classifier, which leaves nothing
    /// for the matte refiner to do. `Some(delta)` labels distances in
    /// `[tolerance - delta, tolerance + delta)` as [`UNKNOWN`].
    pub unknown_band: Option<f32>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            tolerance: 30.0,
            unknown_band: None,
        }
    }
}

impl ClassifierOptions {
    /// Binary classification with the given tolerance
    pub const fn binary(tolerance: f32) -> Self {
        Self {
            tolerance,
            unknown_band: None,
        }
    }

    /// Classification with an unknown band of half-width `band`
    pub const fn with_unknown_band(tolerance: f32, band: f32) -> Self {
        Self {
            tolerance,
            unknown_band: Some(band),
        }
    }

    fn validate(&self) -> Result<(), SegmentationError> {
        if !(0.0..=100.0).contains(&self.tolerance) {
            return Err(SegmentationError::InvalidTolerance {
                tolerance: self.tolerance,
            });
        }
        if let Some(band) = self.unknown_band {
            if !(band.is_finite() && band >= 0.0) {
                return Err(SegmentationError::InvalidUnknownBand { band });
            }
        }
        Ok(())
    }
}

/// Labels every pixel by its color distance to the closest background sample
///
/// The minimum Euclidean RGB distance to any sample is normalized by
/// `sqrt(3 * 255²)` and scaled to `0..=100`. Pixels closer than the tolerance
/// are background (`0`), the rest foreground (`255`), except for the optional
/// unknown band (`128`).
///
/// # Errors
///
/// * `SegmentationError::InvalidTolerance` - When tolerance is outside `[0, 100]`
/// * `SegmentationError::InvalidUnknownBand` - When the band is negative or not finite
/// * `SegmentationError::NoSamples` - When `samples` is empty
/// * `SegmentationError::EmptyImage` - When the image has zero area
pub fn classify(
    image: &Image<Rgba<u8>>,
    samples: &[ColorSample],
    options: ClassifierOptions,
) -> Result<Image<Luma<u8>>, SegmentationError> {
    options.validate()?;
    if samples.is_empty() {
        return Err(SegmentationError::NoSamples);
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage { buffer: "image" });
    }

    let band = options.unknown_band.unwrap_or(0.0);
    let background_below = options.tolerance - band;
    let foreground_from = options.tolerance + band;

    let raw = image.as_raw();
    let mut output = vec![0u8; (width * height) as usize];
    fill_rows(&mut output, width as usize, |y, row| {
        let row_start = y * width as usize;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = (row_start + x) * 4;
            let pixel = &raw[idx..idx + 4];

            let min_squared = samples
                .iter()
                .map(|sample| rgb_distance_squared(pixel, &sample.0))
                .fold(f32::INFINITY, f32::min);
            let distance = min_squared.sqrt() / MAX_RGB_DISTANCE * 100.0;

            *out = if distance < background_below {
                BACKGROUND
            } else if distance >= foreground_from {
                FOREGROUND
            } else {
                UNKNOWN
            };
        }
    });

    Image::from_raw(width, height, output).ok_or(SegmentationError::EmptyImage { buffer: "image" })
}

/// Extension trait running border sampling and classification in one step
pub trait CoarseClassify {
    /// Samples `samples_per_edge` colors per border and classifies the image against them
    ///
    /// # Examples
    ///
    /// ```
    /// use image::Rgba;
    /// use imageops_matte::{ClassifierOptions, CoarseClassify, Image};
    ///
    /// let image: Image<Rgba<u8>> = Image::from_fn(4, 4, |x, y| {
    ///     if (1..3).contains(&x) && (1..3).contains(&y) {
    ///         Rgba([255, 0, 0, 255])
    ///     } else {
    ///         Rgba([0, 0, 255, 255])
    ///     }
    /// });
    /// let trimap = image.coarse_classify(20, ClassifierOptions::default()).unwrap();
    /// assert_eq!(trimap.get_pixel(0, 0)[0], 0);
    /// assert_eq!(trimap.get_pixel(1, 1)[0], 255);
    /// ```
    fn coarse_classify(
        &self,
        samples_per_edge: u32,
        options: ClassifierOptions,
    ) -> Result<Image<Luma<u8>>, SegmentationError>;
}

impl CoarseClassify for Image<Rgba<u8>> {
    fn coarse_classify(
        &self,
        samples_per_edge: u32,
        options: ClassifierOptions,
    ) -> Result<Image<Luma<u8>>, SegmentationError> {
        let samples = sample_border_colors(self, samples_per_edge)?;
        classify(self, &samples, options)
    }
}
