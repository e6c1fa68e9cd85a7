use super::types::Mask;
use anyhow::Result;
use image::{imageops, GrayImage, RgbImage};
use ndarray::Array4;

/// Memory layout of the model's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TensorLayout {
    /// [1, 3, height, width]
    #[default]
    Nchw,
    /// [1, height, width, 3]
    Nhwc,
}

/// Preprocessor for converting RGB images to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
    layout: TensorLayout,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32, layout: TensorLayout) -> Self {
        Self {
            target_width,
            target_height,
            layout,
        }
    }

    /// Preprocess an RGB image into a normalized tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Convert to float and normalize to [0, 1]
    /// 3. Lay out as NCHW or NHWC
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let (w, h) = (width as usize, height as usize);
        let mut tensor = match self.layout {
            TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
            TensorLayout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
        };

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                match self.layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                }
            }
        }

        Ok(tensor)
    }

    /// Convert mask to grayscale image for visualization
    pub fn mask_to_gray(mask: &Mask) -> GrayImage {
        let (width, height) = mask.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let value = (mask.get(x, y) * 255.0).clamp(0.0, 255.0) as u8;
            image::Luma([value])
        })
    }
}

/// Resample a mask to the given size with bilinear interpolation
///
/// Sample positions are pixel-centre aligned and clamped at the edges.
/// Interpolating between equal neighbours yields that value exactly, so a
/// uniform mask stays uniform at any size.
pub fn resample_bilinear(mask: &Mask, target_width: u32, target_height: u32) -> Vec<f32> {
    let (src_w, src_h) = mask.dimensions();
    if (src_w, src_h) == (target_width, target_height) {
        return mask.as_slice().to_vec();
    }

    let _span = tracing::debug_span!("resample").entered();
    tracing::debug!(
        "Resampling mask {}x{} -> {}x{}",
        src_w,
        src_h,
        target_width,
        target_height
    );

    let scale_x = src_w as f32 / target_width as f32;
    let scale_y = src_h as f32 / target_height as f32;

    // Source coordinate, lower neighbour index and weight along one axis
    let axis = |dst: u32, scale: f32, src_len: u32| -> (u32, u32, f32) {
        let pos = ((dst as f32 + 0.5) * scale - 0.5).clamp(0.0, (src_len - 1) as f32);
        let lo = pos.floor() as u32;
        let hi = (lo + 1).min(src_len - 1);
        (lo, hi, pos - lo as f32)
    };
    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    // NaN cells are background and must not spread to their neighbours
    let at = |x: u32, y: u32| {
        let p = mask.get(x, y);
        if p.is_nan() {
            0.0
        } else {
            p
        }
    };

    let columns: Vec<(u32, u32, f32)> = (0..target_width)
        .map(|x| axis(x, scale_x, src_w))
        .collect();

    let mut out = Vec::with_capacity(target_width as usize * target_height as usize);
    for y in 0..target_height {
        let (y0, y1, ty) = axis(y, scale_y, src_h);
        for &(x0, x1, tx) in &columns {
            let top = lerp(at(x0, y0), at(x1, y0), tx);
            let bottom = lerp(at(x0, y1), at(x1, y1), tx);
            out.push(lerp(top, bottom, ty));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_identity() {
        let mask = Mask::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(resample_bilinear(&mask, 2, 2), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn uniform_mask_stays_exact() {
        let p = 0.500_001_f32;
        let mask = Mask::uniform(1, 1, p).unwrap();
        let out = resample_bilinear(&mask, 7, 5);
        assert_eq!(out.len(), 35);
        assert!(out.iter().all(|&v| v == p));
    }

    #[test]
    fn upsampling_interpolates_between_columns() {
        let mask = Mask::new(2, 1, vec![0.0, 1.0]).unwrap();
        let out = resample_bilinear(&mask, 4, 1);
        // Outer samples clamp to the edge values, inner ones blend
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3], 1.0);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[2] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn nan_cells_count_as_background_without_spreading() {
        let mask = Mask::new(2, 1, vec![1.0, f32::NAN]).unwrap();
        let out = resample_bilinear(&mask, 8, 1);
        assert!(out.iter().all(|v| !v.is_nan()));
        assert_eq!(out[0], 1.0);
        assert_eq!(out[7], 0.0);
    }

    #[test]
    fn downsampling_keeps_rows_separate() {
        let mask = Mask::new(4, 4, {
            let mut v = vec![1.0; 8];
            v.extend(vec![0.0; 8]);
            v
        })
        .unwrap();
        let out = resample_bilinear(&mask, 2, 2);
        assert_eq!(out.len(), 4);
        assert!(out[0] > 0.5 && out[1] > 0.5);
        assert!(out[2] < 0.5 && out[3] < 0.5);
    }

    #[test]
    fn preprocess_nchw_normalizes() {
        let image = RgbImage::from_pixel(4, 2, image::Rgb([255, 0, 51]));
        let tensor = Preprocessor::new(4, 2, TensorLayout::Nchw)
            .preprocess(&image)
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 1.0);
        assert_eq!(tensor[[0, 1, 1, 3]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn preprocess_nhwc_resizes() {
        let image = RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255]));
        let tensor = Preprocessor::new(4, 3, TensorLayout::Nhwc)
            .preprocess(&image)
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 4, 3]);
    }

    #[test]
    fn mask_to_gray_scales_values() {
        let mask = Mask::new(2, 1, vec![0.0, 1.0]).unwrap();
        let gray = Preprocessor::mask_to_gray(&mask);
        assert_eq!(gray.get_pixel(0, 0)[0], 0);
        assert_eq!(gray.get_pixel(1, 0)[0], 255);
    }
}
