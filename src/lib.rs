mod error;
mod imageops_matte;
#[cfg(test)]
mod test_utils;
mod utils;

pub use error::{
    AlphaMaskError, BilateralFilterError, BoxFilterError, BufferError, GuidedFilterError,
    PipelineError, SegmentationError,
};
pub use imageops_matte::antialias::antialias;
pub use imageops_matte::apply_alpha_mask::ModifyAlpha;
pub use imageops_matte::bilateral_filter::BilateralFilterExt;
pub use imageops_matte::box_filter::BoxFilter;
pub use imageops_matte::buffers::{mask_from_raw, rgba_image_from_raw};
pub use imageops_matte::classifier::{classify, ClassifierOptions, CoarseClassify};
pub use imageops_matte::color_sampler::{sample_border_colors, ColorSample, DEFAULT_SAMPLES_PER_EDGE};
pub use imageops_matte::defringe::{defringe, DEFAULT_DEFRINGE_STRENGTH};
pub use imageops_matte::guided_filter::{GuidedFilter, GuidedFilterExt, GuidedFilterScratch};
pub use imageops_matte::mask_cleanup::{clean_mask, MaskCleanup};
pub use imageops_matte::matte_refiner::{refine_matte, RefineOptions};
pub use imageops_matte::pipeline::{MatteResult, MattePipeline, PipelineConfig, Smoother};
pub use imageops_matte::segmentation::{
    normalize_probability, probability_to_trimap, resize_mask, SegmentationModel,
};
pub use imageops_matte::trimap::{
    count_unknown, is_unknown, trimap_from_mask, trimap_from_probability, BACKGROUND, DEFAULT_PROBABILITY_THRESHOLDS,
    FOREGROUND, UNKNOWN,
};

pub use imageproc::definitions::Image;
