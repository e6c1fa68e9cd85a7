use crate::error::{HeadshotError, Result};
use image::RgbImage;

/// Foreground probabilities, one per cell, flattened in row-major order.
/// 0.0 = background, 1.0 = foreground. The grid is usually the model's
/// resolution, not the photo's.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(HeadshotError::invalid(format!(
                "mask must have positive dimensions, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(HeadshotError::invalid(format!(
                "mask {}x{} needs {} values, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask with the same probability everywhere
    pub fn uniform(width: u32, height: u32, probability: f32) -> Result<Self> {
        let len = width as usize * height as usize;
        Self::new(width, height, vec![probability; len])
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Probability at (x, y). Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Trait for segmentation models
/// Allows swapping between an ONNX model and a precomputed mask
pub trait SegmentationModel {
    /// Produce a foreground mask for a photo
    ///
    /// The returned mask may be smaller than the photo; the compositor
    /// resamples it.
    fn segment(&mut self, photo: &RgbImage) -> anyhow::Result<Mask>;

    /// Get the model's preferred input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

impl<T: SegmentationModel + ?Sized> SegmentationModel for Box<T> {
    fn segment(&mut self, photo: &RgbImage) -> anyhow::Result<Mask> {
        (**self).segment(photo)
    }

    fn input_size(&self) -> (u32, u32) {
        (**self).input_size()
    }
}
