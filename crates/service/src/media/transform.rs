//! Upload optimization: bound the longest edge and re-encode as JPEG.

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot encode image: {0}")]
    Encode(String),
}

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn size(&self) -> usize { self.bytes.len() }
}

/// CPU-bound; callers run it on the blocking pool.
pub trait ImageTransform: Send + Sync {
    fn resize_and_encode(&self, bytes: &[u8], max_dimension: u32, quality: u8) -> Result<EncodedImage, TransformError>;
}

/// Lanczos downscale (never upscale) followed by baseline JPEG encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegTransform;

impl ImageTransform for JpegTransform {
    fn resize_and_encode(&self, bytes: &[u8], max_dimension: u32, quality: u8) -> Result<EncodedImage, TransformError> {
        let img = image::load_from_memory(bytes).map_err(|e| TransformError::Decode(e.to_string()))?;
        let (w, h) = img.dimensions();
        let img = if w > max_dimension || h > max_dimension {
            img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
        } else {
            img
        };
        let rgb = img.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| TransformError::Encode(e.to_string()))?;
        Ok(EncodedImage { width: rgb.width(), height: rgb.height(), bytes: out })
    }
}
