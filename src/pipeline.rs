use crate::compositor::{composite_foreground, persist};
use crate::error::{HeadshotError, Result};
use crate::records::{NewRecord, Record, RecordStore};
use crate::segmentation::{Mask, SegmentationModel};
use crate::storage::{OutputFormat, StorageReference, StorageSink};
use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::oneshot;

/// A background-free photo that has been written to storage
#[derive(Debug, Clone)]
pub struct Headshot {
    pub image: RgbaImage,
    pub reference: StorageReference,
    /// Mask the cutout was made from, at the model's resolution
    pub mask: Mask,
}

impl Headshot {
    /// Save the headshot in the record list under a name and phone number
    pub async fn confirm<R: RecordStore>(
        &self,
        records: &R,
        name: &str,
        phone: &str,
    ) -> Result<Record> {
        let record = NewRecord::new(name, phone, self.reference.to_string())?;
        let stored = records.insert(record).await?;
        tracing::info!("Saved record {} for {}", stored.id, stored.name);
        Ok(stored)
    }
}

/// Segment, composite and persist one photo at a time
pub struct HeadshotPipeline<M, S> {
    model: M,
    sink: S,
    format: OutputFormat,
}

impl<M, S> HeadshotPipeline<M, S>
where
    M: SegmentationModel,
    S: StorageSink,
{
    pub fn new(model: M, sink: S, format: OutputFormat) -> Self {
        Self {
            model,
            sink,
            format,
        }
    }

    pub fn process(&mut self, photo: &RgbaImage) -> Result<Headshot> {
        let (width, height) = photo.dimensions();
        if width == 0 || height == 0 {
            return Err(HeadshotError::invalid(format!(
                "photo must have positive dimensions, got {}x{}",
                width, height
            )));
        }

        let segment_start = Instant::now();
        let rgb: RgbImage = photo.convert();
        let mask = self.model.segment(&rgb).map_err(|e| {
            tracing::error!("Segmentation failed: {:#}", e);
            HeadshotError::Segmentation(e)
        })?;
        let segment_time = segment_start.elapsed();

        let composite_start = Instant::now();
        let image = composite_foreground(photo, &mask)?;
        let composite_time = composite_start.elapsed();

        let persist_start = Instant::now();
        let reference = persist(&image, &self.sink, self.format)?;
        let persist_time = persist_start.elapsed();

        tracing::debug!(
            "Photo {}x{}: segment={:.1}ms, composite={:.1}ms, persist={:.1}ms",
            width,
            height,
            segment_time.as_secs_f64() * 1000.0,
            composite_time.as_secs_f64() * 1000.0,
            persist_time.as_secs_f64() * 1000.0
        );
        tracing::info!("Saved headshot to {}", reference);

        Ok(Headshot {
            image,
            reference,
            mask,
        })
    }
}

/// Run the pipeline on a blocking worker and report the outcome once
///
/// Must be called from within a tokio runtime. Invocations sharing a
/// pipeline run one after another.
pub fn process_in_background<M, S>(
    pipeline: Arc<Mutex<HeadshotPipeline<M, S>>>,
    photo: RgbaImage,
) -> oneshot::Receiver<Result<Headshot>>
where
    M: SegmentationModel + Send + 'static,
    S: StorageSink + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let mut pipeline = pipeline.lock().unwrap_or_else(PoisonError::into_inner);
        let result = pipeline.process(&photo);
        if let Err(e) = &result {
            tracing::warn!("Background processing failed: {}", e);
        }
        if tx.send(result).is_err() {
            tracing::debug!("Result receiver dropped before completion");
        }
    });

    rx
}

/// Wait for the outcome of [`process_in_background`]
pub async fn wait_for(rx: oneshot::Receiver<Result<Headshot>>) -> Result<Headshot> {
    rx.await.map_err(|_| HeadshotError::Notification)?
}
