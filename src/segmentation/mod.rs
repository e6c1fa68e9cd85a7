mod mask_image;
mod preprocess;
mod selfie;
pub mod types;

pub use mask_image::MaskImage;
pub use preprocess::{resample_bilinear, Preprocessor, TensorLayout};
pub use selfie::SelfieSegmenter;
pub use types::{Mask, SegmentationModel};

use anyhow::Result;
use std::path::Path;

/// Create the default segmentation model (ONNX selfie segmenter)
pub fn create_default_model<P: AsRef<Path>>(
    model_path: P,
    size: u32,
    layout: TensorLayout,
) -> Result<Box<dyn SegmentationModel + Send>> {
    let model = SelfieSegmenter::new(model_path, size, layout)?;
    Ok(Box::new(model))
}
