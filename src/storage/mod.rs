mod directory;

pub use directory::DirectorySink;

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Encoding used when persisting a composited image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Lossy, maximum quality, no alpha channel
    #[default]
    Jpeg,
    /// Lossless, keeps transparency
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Locator of a persisted file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageReference(PathBuf);

impl StorageReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Trait for durable storage destinations
pub trait StorageSink {
    /// Write `bytes` under a name derived from `filename_hint`
    ///
    /// Must never overwrite earlier writes: each call returns a distinct
    /// reference.
    fn store(&self, bytes: &[u8], filename_hint: &str) -> Result<StorageReference>;
}
