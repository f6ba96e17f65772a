pub mod antialias;
pub mod apply_alpha_mask;
pub mod bilateral_filter;
pub mod box_filter;
pub mod buffers;
pub mod classifier;
pub mod color_sampler;
pub mod defringe;
pub mod guided_filter;
pub mod mask_cleanup;
pub mod matte_refiner;
pub mod pipeline;
pub mod segmentation;
pub mod trimap;
