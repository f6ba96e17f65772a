use crate::error::BoxFilterError;
use image::Luma;
use imageproc::definitions::Image;

/// Trait providing a separable mean (box) filter with edge-replicated borders
///
/// The filter runs a horizontal sliding-window pass of width `2 * x_radius + 1`
/// followed by a vertical pass of height `2 * y_radius + 1`. Out-of-image taps
/// read the nearest edge pixel, so every window averages exactly
/// `(2 * x_radius + 1) * (2 * y_radius + 1)` samples.
pub trait BoxFilter {
    /// Output type of the filter
    type Output;

    /// Error type of the filter
    type Error;

    /// Applies the box filter with separate horizontal and vertical radii
    ///
    /// # Errors
    ///
    /// * `BoxFilterError::EmptyImage` - When the image has zero width or height
    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, Self::Error>;

    /// Applies the box filter with a square window
    fn box_filter_square(&self, radius: u32) -> Result<Self::Output, Self::Error> {
        self.box_filter(radius, radius)
    }
}

impl BoxFilter for Image<Luma<f32>> {
    type Output = Self;
    type Error = BoxFilterError;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, Self::Error> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(BoxFilterError::EmptyImage);
        }

        let mut output = vec![0.0; self.as_raw().len()];
        let mut scratch = vec![0.0; self.as_raw().len()];
        box_filter_into(
            self.as_raw(),
            &mut output,
            &mut scratch,
            width as usize,
            height as usize,
            x_radius as usize,
            y_radius as usize,
        )?;

        Image::from_raw(width, height, output).ok_or(BoxFilterError::LengthMismatch {
            expected: (width * height) as usize,
            actual: self.as_raw().len(),
        })
    }
}

/// Sample types the box filter runs on; window sums are always accumulated in `f64`
pub trait BoxSample: Copy + Into<f64> {
    fn from_f64(value: f64) -> Self;
}

impl BoxSample for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl BoxSample for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Box-filters a flat row-major buffer into `dst`, using `scratch` for the horizontal pass
///
/// All three buffers must hold `width * height` values. `dst` and `scratch`
/// are overwritten; `src` is only read.
///
/// Cost is `O(width * height)` per pass; the running window sum is updated
/// incrementally and accumulated in `f64`.
pub fn box_filter_into<T: BoxSample>(
    src: &[T],
    dst: &mut [T],
    scratch: &mut [T],
    width: usize,
    height: usize,
    x_radius: usize,
    y_radius: usize,
) -> Result<(), BoxFilterError> {
    if width == 0 || height == 0 {
        return Err(BoxFilterError::EmptyImage);
    }
    let expected = width * height;
    for actual in [src.len(), dst.len(), scratch.len()] {
        if actual != expected {
            return Err(BoxFilterError::LengthMismatch { expected, actual });
        }
    }

    for y in 0..height {
        sliding_mean(src, scratch, y * width, 1, width, x_radius);
    }
    for x in 0..width {
        sliding_mean(scratch, dst, x, width, height, y_radius);
    }

    Ok(())
}

/// Convenience wrapper around [`box_filter_into`] with a square window
pub fn box_filter<T: BoxSample>(
    src: &[T],
    width: usize,
    height: usize,
    radius: usize,
) -> Result<Vec<T>, BoxFilterError> {
    let zero = T::from_f64(0.0);
    let mut dst = vec![zero; src.len()];
    let mut scratch = vec![zero; src.len()];
    box_filter_into(src, &mut dst, &mut scratch, width, height, radius, radius)?;
    Ok(dst)
}

/// One strided 1D pass: element `i` lives at `offset + i * stride`.
fn sliding_mean<T: BoxSample>(
    src: &[T],
    dst: &mut [T],
    offset: usize,
    stride: usize,
    len: usize,
    radius: usize,
) {
    let last = (len - 1) as isize;
    let at = |i: isize| -> f64 { src[offset + i.clamp(0, last) as usize * stride].into() };

    let r = radius as isize;
    let window = (2 * radius + 1) as f64;
    let mut sum: f64 = (-r..=r).map(at).sum();

    for i in 0..len {
        dst[offset + i * stride] = T::from_f64(sum / window);
        let i = i as isize;
        sum += at(i + r + 1) - at(i - r);
    }
}
