use thiserror::Error;

/// Error type for building images and masks from raw byte buffers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Width or height is zero
    #[error("{buffer}: image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage {
        buffer: &'static str,
        width: u32,
        height: u32,
    },

    /// The raw buffer length does not match `width * height * channels`
    ///
    /// This error is returned instead of truncating or padding the data.
    #[error("{buffer}: expected {expected} bytes for {width}x{height}, got {actual}")]
    LengthMismatch {
        buffer: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Error type for the separable box filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoxFilterError {
    /// Attempted to filter an image with zero width or height
    #[error("Cannot apply box filter to an empty image")]
    EmptyImage,

    /// The flat buffer does not hold `width * height` values
    #[error("Box filter buffer holds {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Error type for guided filter operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidedFilterError {
    /// Guidance image or input signal has zero width or height
    #[error("Guided filter requires a non-empty image")]
    EmptyImage,

    /// Regularization must be strictly positive
    ///
    /// A zero epsilon would divide by the local variance, which is zero
    /// in flat regions of the guidance image.
    #[error("Invalid epsilon: {epsilon}. Epsilon must be greater than 0")]
    InvalidEpsilon { epsilon: f32 },

    /// Guidance image and input signal have different dimensions
    #[error("Dimension mismatch: guidance image is {guidance_dims:?}, input signal is {input_dims:?}")]
    DimensionMismatch {
        guidance_dims: (u32, u32),
        input_dims: (u32, u32),
    },

    /// Box filtering of a local statistic failed
    #[error(transparent)]
    BoxFilter(#[from] BoxFilterError),
}

/// Error type for bilateral filter operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BilateralFilterError {
    /// Guide image or mask has zero width or height
    #[error("Bilateral filter requires a non-empty image")]
    EmptyImage,

    /// Spatial sigma must be finite and strictly positive
    #[error("Invalid spatial sigma: {sigma}. Must be finite and greater than 0")]
    InvalidSpatialSigma { sigma: f32 },

    /// Range sigma must be strictly positive (infinity is accepted)
    #[error("Invalid range sigma: {sigma}. Must be greater than 0")]
    InvalidRangeSigma { sigma: f32 },

    /// Guide image and mask have different dimensions
    #[error("Dimension mismatch: guide image is {guide_dims:?}, mask is {mask_dims:?}")]
    DimensionMismatch {
        guide_dims: (u32, u32),
        mask_dims: (u32, u32),
    },
}

/// Error type for trimap seeding: border sampling, coarse classification
/// and external probability masks
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentationError {
    /// Image has zero width or height
    #[error("{buffer}: image dimensions must be non-zero")]
    EmptyImage { buffer: &'static str },

    /// At least one sample per border edge is required
    #[error("Samples per edge must be greater than 0, got {samples}")]
    InvalidSampleCount { samples: u32 },

    /// The background sample list is empty
    #[error("Background color sample list is empty")]
    NoSamples,

    /// Tolerance must lie in `[0, 100]`
    #[error("Invalid tolerance: {tolerance}. Must be within [0, 100]")]
    InvalidTolerance { tolerance: f32 },

    /// Unknown band half-width must be finite and non-negative
    #[error("Invalid unknown band: {band}. Must be finite and non-negative")]
    InvalidUnknownBand { band: f32 },

    /// Probability thresholds must satisfy `0 <= low < high <= 1`
    #[error("Invalid probability thresholds: low={low}, high={high}. Need 0 <= low < high <= 1")]
    InvalidThresholds { low: f32, high: f32 },

    /// The probability mask contains NaN or infinite values
    #[error("Probability mask contains a non-finite value at index {index}")]
    NonFiniteProbability { index: usize },
}

/// Error type for operations on alpha mattes
///
/// Covers matte refinement, defringing, antialiasing and alpha replacement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphaMaskError {
    /// Image and mask dimensions do not match
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// Image or mask has zero width or height
    #[error("{0}: image dimensions must be non-zero")]
    EmptyImage(&'static str),

    /// Invalid parameter provided to the operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Error returned by [`MattePipeline`](crate::MattePipeline)
///
/// Wraps the error of whichever stage failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    GuidedFilter(#[from] GuidedFilterError),

    #[error(transparent)]
    BilateralFilter(#[from] BilateralFilterError),

    #[error(transparent)]
    AlphaMask(#[from] AlphaMaskError),

    /// The injected segmentation model failed
    #[error("Segmentation model failed")]
    Model {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
