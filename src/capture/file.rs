use super::PhotoSource;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// A photo already saved to disk
pub struct PhotoFile {
    path: PathBuf,
}

impl PhotoFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PhotoSource for PhotoFile {
    fn capture(&mut self) -> Result<RgbaImage> {
        tracing::info!("Reading photo from {}", self.path.display());

        let photo = image::open(&self.path)
            .with_context(|| format!("Failed to read photo {}", self.path.display()))?
            .into_rgba8();

        tracing::debug!("Photo is {}x{}", photo.width(), photo.height());
        Ok(photo)
    }
}
