use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the headshot pipeline
#[derive(Debug, Error)]
pub enum HeadshotError {
    /// Malformed image, mask or record input; nothing was attempted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The segmentation capability could not produce a mask
    #[error("segmentation failed")]
    Segmentation(#[source] anyhow::Error),

    /// The composited image could not be encoded
    #[error("failed to encode image")]
    Encode(#[from] image::ImageError),

    /// The storage sink could not be opened or written
    #[error("failed to write {}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record database could not be opened or queried
    #[error("record database error")]
    Database(#[from] sqlx::Error),

    #[error("failed to prepare record database")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("no record with id {0}")]
    RecordNotFound(i64),

    /// The background worker went away before reporting a result
    #[error("background processing ended without a result")]
    Notification,
}

impl HeadshotError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HeadshotError>;
