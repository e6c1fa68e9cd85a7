use super::preprocess::{Preprocessor, TensorLayout};
use super::types::{Mask, SegmentationModel};
use anyhow::{bail, Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

/// Single-image selfie segmentation model running on ONNX Runtime
///
/// The model is expected to take one RGB tensor normalized to [0, 1] and
/// return a single-channel foreground probability map as its first output.
pub struct SelfieSegmenter {
    session: Session,
    preprocessor: Preprocessor,
    layout: TensorLayout,
    width: u32,
    height: u32,
}

impl SelfieSegmenter {
    /// Create a new segmenter from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `size` - Square input resolution the model was exported with
    /// * `layout` - Input tensor layout (MediaPipe exports use NHWC)
    pub fn new<P: AsRef<Path>>(model_path: P, size: u32, layout: TensorLayout) -> Result<Self> {
        let path = model_path.as_ref();

        if size == 0 {
            bail!("Model input size must be positive");
        }

        tracing::info!("Loading selfie segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Selfie segmentation model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(size, size, layout),
            layout,
            width: size,
            height: size,
        })
    }
}

/// Mask dimensions from the output shape: [1, 1, H, W], [1, H, W, 1] or [1, H, W]
///
/// Returns (width, height)
fn mask_dimensions(layout: TensorLayout, shape: &[i64]) -> Result<(u32, u32)> {
    let (h, w) = match (layout, shape) {
        (TensorLayout::Nchw, [_, _, h, w]) => (*h, *w),
        (TensorLayout::Nhwc, [_, h, w, _]) => (*h, *w),
        (_, [_, h, w]) => (*h, *w),
        _ => bail!("Unexpected mask output shape {:?}", shape),
    };
    Ok((u32::try_from(w)?, u32::try_from(h)?))
}

impl SegmentationModel for SelfieSegmenter {
    fn segment(&mut self, photo: &RgbImage) -> Result<Mask> {
        let _span = tracing::debug_span!("selfie_segment").entered();

        let input_tensor = self.preprocessor.preprocess(photo)?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input_tensor.view())?])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Model output is not a float tensor")?;
        let shape: Vec<i64> = shape.iter().copied().collect();
        let (width, height) = mask_dimensions(self.layout, &shape)?;

        tracing::debug!("Model produced {}x{} mask", width, height);

        Ok(Mask::new(width, height, data.to_vec())?)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nchw_output_shape() {
        assert_eq!(
            mask_dimensions(TensorLayout::Nchw, &[1, 1, 144, 256]).unwrap(),
            (256, 144)
        );
    }

    #[test]
    fn nhwc_output_shape() {
        assert_eq!(
            mask_dimensions(TensorLayout::Nhwc, &[1, 144, 256, 1]).unwrap(),
            (256, 144)
        );
    }

    #[test]
    fn rank_three_output_ignores_layout() {
        for layout in [TensorLayout::Nchw, TensorLayout::Nhwc] {
            assert_eq!(mask_dimensions(layout, &[1, 64, 32]).unwrap(), (32, 64));
        }
    }

    #[test]
    fn unexpected_shapes_are_errors() {
        let err = mask_dimensions(TensorLayout::Nchw, &[256, 256]).unwrap_err();
        assert!(err.to_string().contains("Unexpected mask output shape"));

        assert!(mask_dimensions(TensorLayout::Nchw, &[1, 1, 1, 1, 1]).is_err());
        // Dynamic dimensions left unresolved
        assert!(mask_dimensions(TensorLayout::Nchw, &[1, 1, -1, 256]).is_err());
    }
}
