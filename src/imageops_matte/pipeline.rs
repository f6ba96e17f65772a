//! End-to-end matte refinement.
//!
//! [`MattePipeline`] chains the stages of this crate:
//!
//! 1. a trimap seed, either from border color classification or from an
//!    injected [`SegmentationModel`]
//! 2. optional edge-aware smoothing of the trimap ([`Smoother`]), after
//!    which the smoothed signal is relabelled into a trimap with
//!    [`trimap_from_mask`]
//! 3. [`refine_matte`] on every pixel the smoothing left undecided
//! 4. optional [`clean_mask`] of the refined alpha
//! 5. optional [`defringe`] of the color image
//! 6. optional [`antialias`] of the alpha

use crate::error::{AlphaMaskError, PipelineError};
use crate::imageops_matte::antialias::antialias;
use crate::imageops_matte::apply_alpha_mask::ModifyAlpha;
use crate::imageops_matte::bilateral_filter::BilateralFilterExt;
use crate::imageops_matte::classifier::{ClassifierOptions, CoarseClassify};
use crate::imageops_matte::color_sampler::DEFAULT_SAMPLES_PER_EDGE;
use crate::imageops_matte::defringe::{defringe, DEFAULT_DEFRINGE_STRENGTH};
use crate::imageops_matte::guided_filter::GuidedFilterExt;
use crate::imageops_matte::mask_cleanup::{clean_mask, MaskCleanup};
use crate::imageops_matte::matte_refiner::{refine_matte, RefineOptions};
use crate::imageops_matte::segmentation::{probability_to_trimap, SegmentationModel};
use crate::imageops_matte::trimap::{count_unknown, trimap_from_mask, DEFAULT_PROBABILITY_THRESHOLDS};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use log::{debug, trace};

/// Edge-aware smoothing applied to the seed trimap
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Smoother {
    /// Guided filter, see [`GuidedFilterExt`]
    Guided { radius: u32, epsilon: f32 },
    /// Cross bilateral filter, see [`BilateralFilterExt`]
    Bilateral { spatial_sigma: f32, range_sigma: f32 },
    /// Hand the seed trimap to the refiner as is
    None,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::Guided {
            radius: 5,
            epsilon: 0.01,
        }
    }
}

/// Parameters of every pipeline stage
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Border samples per edge for the color classifier
    pub samples_per_edge: u32,
    pub classifier: ClassifierOptions,
    pub smoother: Smoother,
    /// `(low, high)` thresholds relabelling the smoothed signal into a trimap
    pub smoothed_thresholds: (f32, f32),
    pub refine: RefineOptions,
    /// `(low, high)` thresholds turning model probabilities into a trimap
    pub probability_thresholds: (f32, f32),
    /// Hole filling and speck removal on the refined alpha, `None` skips the stage
    pub cleanup: Option<MaskCleanup>,
    /// Defringe blend strength, `None` skips the stage
    pub defringe_strength: Option<f32>,
    pub antialias: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            samples_per_edge: DEFAULT_SAMPLES_PER_EDGE,
            classifier: ClassifierOptions::with_unknown_band(30.0, 5.0),
            smoother: Smoother::default(),
            smoothed_thresholds: DEFAULT_PROBABILITY_THRESHOLDS,
            // The relabelled band is wider than the fixed window
            refine: RefineOptions::adaptive(3, 12),
            probability_thresholds: DEFAULT_PROBABILITY_THRESHOLDS,
            cleanup: Some(MaskCleanup::default()),
            defringe_strength: Some(DEFAULT_DEFRINGE_STRENGTH),
            antialias: true,
        }
    }
}

/// Output of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct MatteResult {
    /// Trimap handed to the refiner, after smoothing and relabelling
    pub trimap: Image<Luma<u8>>,
    /// Final alpha matte
    pub alpha: Image<Luma<u8>>,
    /// Defringed colors, present when defringing is enabled
    pub color: Option<Image<Rgba<u8>>>,
}

impl MatteResult {
    /// Combines the colors with the final alpha into a cutout
    ///
    /// Uses the defringed colors when present and `image` otherwise.
    pub fn composite(&self, image: &Image<Rgba<u8>>) -> Result<Image<Rgba<u8>>, AlphaMaskError> {
        let color = self.color.as_ref().unwrap_or(image).clone();
        color.replace_alpha(&self.alpha)
    }
}

/// Alpha matte refinement pipeline
///
/// # Examples
///
/// ```
/// use image::Rgba;
/// use imageops_matte::{Image, MattePipeline, PipelineConfig};
///
/// let image: Image<Rgba<u8>> = Image::from_fn(64, 64, |x, y| {
///     if (16..48).contains(&x) && (16..48).contains(&y) {
///         Rgba([230, 40, 40, 255])
///     } else {
///         Rgba([40, 40, 230, 255])
///     }
/// });
///
/// let result = MattePipeline::new(PipelineConfig::default()).run(&image).unwrap();
/// assert_eq!(result.alpha.get_pixel(0, 0)[0], 0);
/// assert_eq!(result.alpha.get_pixel(32, 32)[0], 255);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MattePipeline {
    config: PipelineConfig,
}

impl MattePipeline {
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline seeded by border color classification
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that rejects its input or
    /// parameters. No partial result is produced.
    pub fn run(&self, image: &Image<Rgba<u8>>) -> Result<MatteResult, PipelineError> {
        let (width, height) = image.dimensions();
        debug!(
            "classifying {width}x{height} image with {} samples per edge, {:?}",
            self.config.samples_per_edge, self.config.classifier
        );
        let seed = image.coarse_classify(self.config.samples_per_edge, self.config.classifier)?;
        self.refine_seed(image, seed)
    }

    /// Runs the pipeline seeded by a foreground probability model
    ///
    /// The model output may have any resolution; it is normalized, resized
    /// to the image with nearest-neighbour sampling and thresholded with
    /// [`PipelineConfig::probability_thresholds`].
    ///
    /// # Errors
    ///
    /// * `PipelineError::Model` - When the model fails
    /// * Any error of the later stages, as for [`run`](Self::run)
    pub fn run_with_model(
        &self,
        image: &Image<Rgba<u8>>,
        model: &mut dyn SegmentationModel,
    ) -> Result<MatteResult, PipelineError> {
        let (width, height) = image.dimensions();
        let probability = model
            .predict(image)
            .map_err(|source| PipelineError::Model { source })?;
        debug!(
            "model returned {:?} probability mask for {width}x{height} image",
            probability.dimensions()
        );
        let seed = probability_to_trimap(&probability, width, height, self.config.probability_thresholds)?;
        self.refine_seed(image, seed)
    }

    fn refine_seed(
        &self,
        image: &Image<Rgba<u8>>,
        seed: Image<Luma<u8>>,
    ) -> Result<MatteResult, PipelineError> {
        trace!("seed trimap has {} unknown pixels", count_unknown(&seed));

        let smoothed = match self.config.smoother {
            Smoother::Guided { radius, epsilon } => {
                debug!("guided filter: radius {radius}, epsilon {epsilon}");
                Some(seed.guided_filter(image, radius, epsilon)?)
            }
            Smoother::Bilateral {
                spatial_sigma,
                range_sigma,
            } => {
                debug!("bilateral filter: spatial sigma {spatial_sigma}, range sigma {range_sigma}");
                Some(seed.bilateral_filter(image, spatial_sigma, range_sigma)?)
            }
            Smoother::None => None,
        };
        let trimap = match smoothed {
            Some(smoothed) => {
                let (low, high) = self.config.smoothed_thresholds;
                trimap_from_mask(&smoothed, low, high)?
            }
            None => seed,
        };
        trace!("relabelled trimap has {} unknown pixels", count_unknown(&trimap));

        debug!("refining matte with {:?}", self.config.refine);
        let mut alpha = refine_matte(image, &trimap, self.config.refine)?;

        if let Some(cleanup) = self.config.cleanup {
            debug!("cleaning matte with {cleanup:?}");
            alpha = clean_mask(&alpha, cleanup)?;
        }

        let color = match self.config.defringe_strength {
            Some(strength) => {
                debug!("defringing with strength {strength}");
                Some(defringe(image, &alpha, strength)?)
            }
            None => None,
        };

        if self.config.antialias {
            debug!("antialiasing edge band");
            alpha = antialias(&alpha)?;
        }

        Ok(MatteResult {
            trimap,
            alpha,
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentationError;
    use crate::imageops_matte::trimap::{is_unknown, BACKGROUND, FOREGROUND, UNKNOWN};
    use crate::test_utils::{create_rect_image, create_solid_image};
    use std::error::Error;

    fn square_image() -> Image<Rgba<u8>> {
        create_rect_image(40, 40, (10, 10, 30, 30), [220, 60, 60], [50, 60, 200])
    }

    struct ConstantModel {
        calls: usize,
        size: (u32, u32),
    }

    impl SegmentationModel for ConstantModel {
        fn predict(
            &mut self,
            _image: &Image<Rgba<u8>>,
        ) -> Result<Image<Luma<f32>>, Box<dyn Error + Send + Sync>> {
            self.calls += 1;
            let (w, h) = self.size;
            // Low-resolution square in the middle
            Ok(Image::from_fn(w, h, |x, y| {
                let inside = (w / 4..3 * w / 4).contains(&x) && (h / 4..3 * h / 4).contains(&y);
                Luma([if inside { 0.95 } else { 0.02 }])
            }))
        }
    }

    struct FailingModel;

    impl SegmentationModel for FailingModel {
        fn predict(
            &mut self,
            _image: &Image<Rgba<u8>>,
        ) -> Result<Image<Luma<f32>>, Box<dyn Error + Send + Sync>> {
            Err("session not loaded".into())
        }
    }

    #[test]
    fn test_run_separates_square() {
        let image = square_image();
        let result = MattePipeline::default().run(&image).unwrap();

        assert_eq!(result.alpha.dimensions(), (40, 40));
        assert_eq!(result.alpha.get_pixel(2, 2)[0], BACKGROUND);
        assert_eq!(result.alpha.get_pixel(20, 20)[0], FOREGROUND);
        assert!(result.color.is_some());
    }

    #[test]
    fn test_clean_seed_survives_default_pipeline() {
        let image = square_image();
        let seed = image
            .coarse_classify(DEFAULT_SAMPLES_PER_EDGE, PipelineConfig::default().classifier)
            .unwrap();
        assert_eq!(count_unknown(&seed), 0);

        let result = MattePipeline::default().run(&image).unwrap();

        // Chebyshev distance to the boundary of the [10, 30) square
        let edge_distance = |x: u32, y: u32| {
            let (x, y) = (i64::from(x), i64::from(y));
            let outside = (10 - x).max(x - 29).max(10 - y).max(y - 29);
            let inside = (x - 10).min(29 - x).min(y - 10).min(29 - y);
            if outside > 0 { outside } else { inside }
        };
        for (x, y, alpha) in result.alpha.enumerate_pixels() {
            if edge_distance(x, y) < 6 {
                continue;
            }
            let inside = (10..30).contains(&x) && (10..30).contains(&y);
            let expected = if inside { FOREGROUND } else { BACKGROUND };
            assert_eq!(alpha[0], expected, "({x}, {y})");
        }

        let partial = result.alpha.pixels().filter(|p| is_unknown(p[0])).count();
        assert!(partial < 400, "{partial} partial pixels");
    }

    #[test]
    fn test_smoothed_signal_is_relabelled() {
        let image = square_image();
        let result = MattePipeline::default().run(&image).unwrap();
        assert!(result
            .trimap
            .pixels()
            .all(|p| [BACKGROUND, UNKNOWN, FOREGROUND].contains(&p[0])));
    }

    #[test]
    fn test_cleanup_removes_seed_specks() {
        // Two isolated pixels share the subject color but lie in the background
        let mut image = square_image();
        image.put_pixel(3, 34, Rgba([220, 60, 60, 255]));
        image.put_pixel(35, 4, Rgba([220, 60, 60, 255]));
        let config = PipelineConfig {
            smoother: Smoother::None,
            defringe_strength: None,
            antialias: false,
            ..PipelineConfig::default()
        };

        let result = MattePipeline::new(config.clone()).run(&image).unwrap();
        assert_eq!(result.trimap.get_pixel(3, 34)[0], FOREGROUND);
        assert_eq!(result.alpha.get_pixel(3, 34)[0], BACKGROUND);
        assert_eq!(result.alpha.get_pixel(35, 4)[0], BACKGROUND);
        assert_eq!(result.alpha.get_pixel(20, 20)[0], FOREGROUND);

        let uncleaned = MattePipeline::new(PipelineConfig {
            cleanup: None,
            ..config
        })
        .run(&image)
        .unwrap();
        assert_eq!(uncleaned.alpha.get_pixel(3, 34)[0], FOREGROUND);
    }

    #[test]
    fn test_all_stages_disabled_is_binary_classification() {
        let image = square_image();
        let config = PipelineConfig {
            classifier: ClassifierOptions::binary(30.0),
            smoother: Smoother::None,
            cleanup: None,
            defringe_strength: None,
            antialias: false,
            ..PipelineConfig::default()
        };

        let result = MattePipeline::new(config).run(&image).unwrap();
        let expected = image.coarse_classify(20, ClassifierOptions::binary(30.0)).unwrap();
        assert_eq!(result.alpha, expected);
        assert_eq!(result.trimap, expected);
        assert!(result.color.is_none());
    }

    #[test]
    fn test_bilateral_smoother() {
        let image = square_image();
        let config = PipelineConfig {
            smoother: Smoother::Bilateral {
                spatial_sigma: 1.5,
                range_sigma: 0.1,
            },
            ..PipelineConfig::default()
        };

        let result = MattePipeline::new(config).run(&image).unwrap();
        assert_eq!(result.alpha.get_pixel(0, 0)[0], BACKGROUND);
        assert_eq!(result.alpha.get_pixel(20, 20)[0], FOREGROUND);
    }

    #[test]
    fn test_run_with_model_resizes_low_resolution_output() {
        let image = square_image();
        let mut model = ConstantModel {
            calls: 0,
            size: (8, 8),
        };

        let config = PipelineConfig {
            smoother: Smoother::None,
            ..PipelineConfig::default()
        };
        let result = MattePipeline::new(config).run_with_model(&image, &mut model).unwrap();

        assert_eq!(model.calls, 1);
        assert_eq!(result.trimap.dimensions(), (40, 40));
        assert_eq!(result.trimap.get_pixel(20, 20)[0], FOREGROUND);
        assert_eq!(result.trimap.get_pixel(1, 1)[0], BACKGROUND);
    }

    #[test]
    fn test_model_failure_is_reported() {
        let image = square_image();
        let err = MattePipeline::default()
            .run_with_model(&image, &mut FailingModel)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Model { .. }));
        assert_eq!(err.source().map(|e| e.to_string()), Some("session not loaded".to_string()));
    }

    #[test]
    fn test_invalid_stage_parameters_fail() {
        let image = create_solid_image(8, 8, [0, 0, 0]);
        let config = PipelineConfig {
            smoother: Smoother::Guided {
                radius: 2,
                epsilon: 0.0,
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            MattePipeline::new(config).run(&image),
            Err(PipelineError::GuidedFilter(_))
        ));

        let empty: Image<Rgba<u8>> = Image::new(0, 0);
        assert!(matches!(
            MattePipeline::default().run(&empty),
            Err(PipelineError::Segmentation(SegmentationError::EmptyImage { .. }))
        ));
    }

    #[test]
    fn test_composite_uses_defringed_color() {
        let image = square_image();
        let result = MattePipeline::default().run(&image).unwrap();
        let cutout = result.composite(&image).unwrap();

        let color = result.color.as_ref().unwrap();
        for (x, y, pixel) in cutout.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let Rgba([cr, cg, cb, _]) = *color.get_pixel(x, y);
            assert_eq!([r, g, b], [cr, cg, cb]);
            assert_eq!(a, result.alpha.get_pixel(x, y)[0]);
        }
    }
}
