//! Background removal: turn a photo and a foreground mask into a cutout.

use crate::error::{HeadshotError, Result};
use crate::segmentation::{resample_bilinear, Mask};
use crate::storage::{OutputFormat, StorageReference, StorageSink};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};

/// Mask cells strictly above this probability are foreground
pub const FOREGROUND_THRESHOLD: f32 = 0.5;

/// JPEG output always uses the highest quality setting
pub const JPEG_QUALITY: u8 = 100;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Keep the foreground of `original` and make everything else transparent
///
/// The mask is resampled to the photo's size when they differ. Foreground
/// pixels keep their RGB and become fully opaque; background pixels are
/// zeroed. The output always has the dimensions of `original`.
pub fn composite_foreground(original: &RgbaImage, mask: &Mask) -> Result<RgbaImage> {
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return Err(HeadshotError::invalid(format!(
            "image must have positive dimensions, got {}x{}",
            width, height
        )));
    }

    let _span = tracing::debug_span!("composite").entered();

    let probabilities = resample_bilinear(mask, width, height);

    let mut output = RgbaImage::new(width, height);
    for ((src, dst), &p) in original
        .pixels()
        .zip(output.pixels_mut())
        .zip(probabilities.iter())
    {
        *dst = if p > FOREGROUND_THRESHOLD {
            Rgba([src[0], src[1], src[2], u8::MAX])
        } else {
            TRANSPARENT
        };
    }

    Ok(output)
}

/// Encode a composited image and hand it to the storage sink
///
/// The file name is derived from the current time; the sink resolves any
/// collision, so every call yields a distinct reference.
pub fn persist(
    image: &RgbaImage,
    sink: &dyn StorageSink,
    format: OutputFormat,
) -> Result<StorageReference> {
    let _span = tracing::debug_span!("persist").entered();

    let bytes = encode(image, format).map_err(|e| {
        tracing::error!("Failed to encode {}x{} image: {}", image.width(), image.height(), e);
        e
    })?;

    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let hint = format!("processed_image_{}.{}", millis, format.extension());

    sink.store(&bytes, &hint).map_err(|e| {
        tracing::error!("Failed to persist {}: {}", hint, e);
        e
    })
}

fn encode(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            // No alpha channel in JPEG: transparent pixels flatten to black
            let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(
                image.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgba8,
            )?;
        }
    }

    Ok(bytes)
}
