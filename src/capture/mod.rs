mod file;
#[cfg(feature = "webcam")]
mod webcam;

pub use file::PhotoFile;
#[cfg(feature = "webcam")]
pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbaImage;

/// Trait for photo sources
pub trait PhotoSource {
    /// Take a single photo
    fn capture(&mut self) -> Result<RgbaImage>;
}
