//! Guided filter (He et al., "Guided Image Filtering") for alpha mattes.
//!
//! The filter fits a local linear model `q = a * I + b` between the grayscale
//! guidance `I` and the output in every `(2r+1)²` window, then averages the
//! coefficients of all windows covering a pixel. In flat guidance regions
//! `a` vanishes and the output is a box blur of the signal; across strong
//! guidance edges `a` grows and the output follows the guidance edge.
//!
//! All local statistics use the separable box filter from
//! [`box_filter`](crate::imageops_matte::box_filter), so the cost does not
//! depend on the radius beyond the initial window sum.

use crate::error::GuidedFilterError;
use crate::imageops_matte::box_filter::box_filter_into;
use crate::utils::{luminance, round_to_u8};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use itertools::{Itertools, MinMaxResult};

/// Extension trait applying the guided filter to a mask
pub trait GuidedFilterExt {
    /// Smooths the mask while aligning its edges with edges of `guidance`
    ///
    /// # Arguments
    ///
    /// * `guidance` - Color image whose luminance guides the smoothing
    /// * `radius` - Window radius in pixels; `0` returns the mask unchanged
    /// * `epsilon` - Regularization, must be greater than 0. Larger values smooth
    ///   across weaker edges
    ///
    /// # Errors
    ///
    /// * `GuidedFilterError::InvalidEpsilon` - When `epsilon <= 0` or NaN
    /// * `GuidedFilterError::DimensionMismatch` - When mask and guidance differ in size
    /// * `GuidedFilterError::EmptyImage` - When either image has zero area
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{Luma, Rgba};
    /// use imageops_matte::{GuidedFilterExt, Image};
    ///
    /// let guidance: Image<Rgba<u8>> = Image::from_pixel(8, 8, Rgba([90, 90, 90, 255]));
    /// let mask: Image<Luma<u8>> = Image::from_fn(8, 8, |x, _| Luma([if x < 4 { 0 } else { 255 }]));
    ///
    /// let smoothed = mask.guided_filter(&guidance, 2, 0.01).unwrap();
    /// assert_eq!(smoothed.dimensions(), (8, 8));
    /// ```
    fn guided_filter(
        &self,
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<u8>>, GuidedFilterError>;
}

impl GuidedFilterExt for Image<Luma<u8>> {
    fn guided_filter(
        &self,
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<u8>>, GuidedFilterError> {
        let filter = GuidedFilter::new(guidance, radius, epsilon)?;
        filter.filter(self)
    }
}

/// A guided filter with the guidance statistics precomputed
///
/// Construct once per guidance image and call [`filter`](Self::filter) for
/// every signal that should follow it.
///
/// Statistics are kept in `f64` on guidance centred at the middle of its
/// range, so a flat guidance window yields exactly zero variance and
/// covariance and the result does not depend on `epsilon` there.
#[derive(Debug, Clone)]
pub struct GuidedFilter {
    width: u32,
    height: u32,
    radius: u32,
    epsilon: f32,
    guidance: Vec<f64>,
    guidance_mean: Vec<f64>,
    guidance_var: Vec<f64>,
}

/// Windows whose guidance variance is below this are flat up to rounding
const VARIANCE_FLOOR: f64 = 1e-12;

/// Reusable buffers for [`GuidedFilter::filter_with_scratch`]
///
/// Buffers grow to the size of the image on first use and are reused on
/// later calls of the same size, e.g. once per video frame.
#[derive(Debug, Clone, Default)]
pub struct GuidedFilterScratch {
    signal: Vec<f64>,
    mean_p: Vec<f64>,
    product: Vec<f64>,
    mean_ip: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    tmp: Vec<f64>,
}

impl GuidedFilterScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pixels the buffers are currently sized for
    pub fn capacity_pixels(&self) -> usize {
        self.signal.len()
    }

    fn prepare(&mut self, len: usize) {
        for buffer in [
            &mut self.signal,
            &mut self.mean_p,
            &mut self.product,
            &mut self.mean_ip,
            &mut self.a,
            &mut self.b,
            &mut self.tmp,
        ] {
            buffer.resize(len, 0.0);
        }
    }
}

impl GuidedFilter {
    /// Precomputes guidance luminance, its local mean and local variance
    ///
    /// # Errors
    ///
    /// * `GuidedFilterError::InvalidEpsilon` - When `epsilon <= 0` or NaN
    /// * `GuidedFilterError::EmptyImage` - When the guidance image has zero area
    pub fn new(
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, GuidedFilterError> {
        validate_epsilon(epsilon)?;
        let (width, height) = guidance.dimensions();
        if width == 0 || height == 0 {
            return Err(GuidedFilterError::EmptyImage);
        }

        let (w, h, r) = (width as usize, height as usize, radius as usize);
        let len = w * h;

        let luma: Vec<f64> = guidance.pixels().map(|p| f64::from(luminance(p))).collect();
        // Midpoint of the range; equal to every sample of a constant image
        let center = match luma.iter().copied().minmax() {
            MinMaxResult::MinMax(min, max) => (min + max) / 2.0,
            MinMaxResult::OneElement(v) => v,
            MinMaxResult::NoElements => return Err(GuidedFilterError::EmptyImage),
        };
        let guidance_centered: Vec<f64> = luma.iter().map(|i| i - center).collect();
        let guidance_sq: Vec<f64> = guidance_centered.iter().map(|i| i * i).collect();

        let mut tmp = vec![0.0; len];
        let mut guidance_mean = vec![0.0; len];
        let mut guidance_sq_mean = vec![0.0; len];
        box_filter_into(&guidance_centered, &mut guidance_mean, &mut tmp, w, h, r, r)?;
        box_filter_into(&guidance_sq, &mut guidance_sq_mean, &mut tmp, w, h, r, r)?;

        // var(I) = E[I²] - E[I]², clamped against rounding below zero
        let guidance_var = guidance_mean
            .iter()
            .zip(&guidance_sq_mean)
            .map(|(&mean, &sq_mean)| mean.mul_add(-mean, sq_mean).max(0.0))
            .collect();

        Ok(Self {
            width,
            height,
            radius,
            epsilon,
            guidance: guidance_centered,
            guidance_mean,
            guidance_var,
        })
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub const fn radius(&self) -> u32 {
        self.radius
    }

    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Filters an 8-bit mask, returning a new mask
    pub fn filter(&self, input: &Image<Luma<u8>>) -> Result<Image<Luma<u8>>, GuidedFilterError> {
        let mut scratch = GuidedFilterScratch::new();
        self.filter_with_scratch(input, &mut scratch)
    }

    /// Filters an 8-bit mask using caller-owned scratch buffers
    pub fn filter_with_scratch(
        &self,
        input: &Image<Luma<u8>>,
        scratch: &mut GuidedFilterScratch,
    ) -> Result<Image<Luma<u8>>, GuidedFilterError> {
        self.validate_input(input.dimensions())?;

        scratch.prepare(input.as_raw().len());
        for (p, &value) in scratch.signal.iter_mut().zip(input.as_raw()) {
            *p = f64::from(value) / 255.0;
        }

        let output = self
            .compute(scratch)?
            .into_iter()
            .map(|q| round_to_u8((q * 255.0) as f32))
            .collect();

        Image::from_raw(self.width, self.height, output).ok_or(GuidedFilterError::EmptyImage)
    }

    /// Filters a flat row-major signal with values in `[0, 1]`
    ///
    /// The output is clamped to `[0, 1]`.
    pub fn filter_normalized(&self, input: &[f32]) -> Result<Vec<f32>, GuidedFilterError> {
        let len = self.guidance.len();
        if input.len() != len {
            return Err(GuidedFilterError::DimensionMismatch {
                guidance_dims: self.dimensions(),
                input_dims: (input.len() as u32, 1),
            });
        }

        let mut scratch = GuidedFilterScratch::new();
        scratch.prepare(len);
        for (p, &value) in scratch.signal.iter_mut().zip(input) {
            *p = f64::from(value);
        }
        Ok(self.compute(&mut scratch)?.into_iter().map(|q| q as f32).collect())
    }

    /// Runs the filter on `scratch.signal`
    fn compute(&self, s: &mut GuidedFilterScratch) -> Result<Vec<f64>, GuidedFilterError> {
        let (w, h, r) = (self.width as usize, self.height as usize, self.radius as usize);
        let epsilon = f64::from(self.epsilon);

        box_filter_into(&s.signal, &mut s.mean_p, &mut s.tmp, w, h, r, r)?;

        for ((prod, &p), &i) in s.product.iter_mut().zip(&s.signal).zip(&self.guidance) {
            *prod = p * i;
        }
        box_filter_into(&s.product, &mut s.mean_ip, &mut s.tmp, w, h, r, r)?;

        for idx in 0..s.a.len() {
            let mean_i = self.guidance_mean[idx];
            let mean_p = s.mean_p[idx];
            let var = self.guidance_var[idx];

            let a = if var < VARIANCE_FLOOR {
                0.0
            } else {
                // cov(I, p) = E[I * p] - E[I] * E[p]
                let cov = mean_i.mul_add(-mean_p, s.mean_ip[idx]);
                cov / (var + epsilon)
            };
            s.a[idx] = a;
            s.b[idx] = a.mul_add(-mean_i, mean_p);
        }

        // mean_p and mean_ip are no longer needed and hold mean(a), mean(b)
        box_filter_into(&s.a, &mut s.mean_p, &mut s.tmp, w, h, r, r)?;
        box_filter_into(&s.b, &mut s.mean_ip, &mut s.tmp, w, h, r, r)?;

        Ok(s.mean_p
            .iter()
            .zip(&s.mean_ip)
            .zip(&self.guidance)
            .map(|((&a_mean, &b_mean), &i)| a_mean.mul_add(i, b_mean).clamp(0.0, 1.0))
            .collect())
    }

    fn validate_input(&self, input_dims: (u32, u32)) -> Result<(), GuidedFilterError> {
        if input_dims.0 == 0 || input_dims.1 == 0 {
            return Err(GuidedFilterError::EmptyImage);
        }
        if input_dims != self.dimensions() {
            return Err(GuidedFilterError::DimensionMismatch {
                guidance_dims: self.dimensions(),
                input_dims,
            });
        }
        Ok(())
    }
}

fn validate_epsilon(epsilon: f32) -> Result<(), GuidedFilterError> {
    // Written this way so NaN is rejected as well
    if !(epsilon > 0.0) {
        return Err(GuidedFilterError::InvalidEpsilon { epsilon });
    }
    Ok(())
}
