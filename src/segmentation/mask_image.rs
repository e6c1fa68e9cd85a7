use super::types::{Mask, SegmentationModel};
use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use std::path::Path;

/// A precomputed mask loaded from a grayscale image
///
/// Each 8-bit value `v` is read as probability `v / 255`. Useful when the
/// segmentation ran elsewhere, and for exercising the pipeline without a
/// model.
pub struct MaskImage {
    mask: Mask,
}

impl MaskImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading mask image from {}", path.display());

        let gray = image::open(path)
            .with_context(|| format!("Failed to open mask image {}", path.display()))?
            .into_luma8();

        Ok(Self::from_gray(&gray)?)
    }

    pub fn from_gray(gray: &GrayImage) -> crate::Result<Self> {
        let (width, height) = gray.dimensions();
        let data = gray.pixels().map(|p| p[0] as f32 / 255.0).collect();
        Ok(Self {
            mask: Mask::new(width, height, data)?,
        })
    }
}

impl SegmentationModel for MaskImage {
    fn segment(&mut self, photo: &RgbImage) -> Result<Mask> {
        tracing::debug!(
            "Using precomputed {}x{} mask for {}x{} photo",
            self.mask.width(),
            self.mask.height(),
            photo.width(),
            photo.height()
        );
        Ok(self.mask.clone())
    }

    fn input_size(&self) -> (u32, u32) {
        self.mask.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_gray_levels_to_probabilities() {
        let gray = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let mut model = MaskImage::from_gray(&gray).unwrap();
        let mask = model.segment(&RgbImage::new(8, 8)).unwrap();
        assert_eq!(mask.as_slice(), &[0.0, 1.0]);
        assert_eq!(model.input_size(), (2, 1));
    }

    #[test]
    fn empty_gray_image_is_invalid() {
        let gray = GrayImage::new(0, 0);
        assert!(MaskImage::from_gray(&gray).is_err());
    }

    #[test]
    fn open_reports_missing_file() {
        let err = MaskImage::open("/nonexistent/mask.png").err().unwrap();
        assert!(err.to_string().contains("Failed to open mask image"));
    }
}
