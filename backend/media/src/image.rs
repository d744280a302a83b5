//! Image preparation for multimodal requests.
//!
//! Any decodable image is flattened to 8-bit RGB, re-encoded as JPEG at a fixed
//! quality, and wrapped in a base64 `data:` URI.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

pub const JPEG_QUALITY: u8 = 85;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
    pub jpeg_bytes: usize,
}

/// Decode, normalize, re-encode, and base64-wrap an uploaded image.
///
/// CPU-bound; async callers should run it on the blocking pool.
pub fn prepare_for_vision(bytes: &[u8]) -> Result<PreparedImage> {
    let decoded = image::load_from_memory(bytes).context("Failed to decode uploaded image")?;
    let source_color = decoded.color();
    let rgb = to_rgb(decoded);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .context("Failed to encode image as JPEG")?;

    debug!(
        ?source_color,
        width = rgb.width(),
        height = rgb.height(),
        jpeg_bytes = jpeg.len(),
        "Prepared image for vision request"
    );

    Ok(PreparedImage {
        data_uri: format!("{DATA_URI_PREFIX}{}", STANDARD.encode(&jpeg)),
        width: rgb.width(),
        height: rgb.height(),
        jpeg_bytes: jpeg.len(),
    })
}

/// Alpha is discarded, palette and grayscale are expanded, 16-bit is narrowed.
fn to_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}
