//! Cover art thumbnailing for constrained playback devices.
//!
//! The device only accepts small square JPEGs, so source art of any shape is
//! center-cropped, scaled to 150x150 and size-capped. Everything here is
//! best-effort: a missing cover never blocks a download.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Edge length of the produced thumbnail.
pub const THUMBNAIL_EDGE_PX: u32 = 150;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const JPEG_QUALITY: u8 = 85;
const JPEG_FALLBACK_QUALITY: u8 = 70;
const MAX_THUMBNAIL_BYTES: usize = 60 * 1024;

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("cover download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("cover download failed: HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("cover image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("cover transform task failed")]
    TaskFailed,
}

/// Fetches source images and turns them into embeddable thumbnails.
pub struct CoverTransformer {
    client: reqwest::Client,
}

impl Default for CoverTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverTransformer {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Download `url` and convert it to the device thumbnail format.
    /// Any failure is logged and collapses to `None`.
    pub async fn build_thumbnail(&self, url: &str) -> Option<Vec<u8>> {
        match self.try_build(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Cover conversion failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn try_build(&self, url: &str) -> Result<Vec<u8>, CoverError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CoverError::Status(response.status()));
        }
        let bytes = response.bytes().await?;

        tokio::task::spawn_blocking(move || transform(&bytes))
            .await
            .map_err(|_| CoverError::TaskFailed)?
    }
}

/// Decode, square-crop, scale and JPEG-encode one source image.
pub(crate) fn transform(bytes: &[u8]) -> Result<Vec<u8>, CoverError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    // center-crop to a square on the shorter side
    let (w, h) = rgb.dimensions();
    let square = if w > h {
        rgb.crop_imm((w - h) / 2, 0, h, h)
    } else if h > w {
        rgb.crop_imm(0, (h - w) / 2, w, w)
    } else {
        rgb
    };

    let thumb = square.resize_exact(THUMBNAIL_EDGE_PX, THUMBNAIL_EDGE_PX, FilterType::Lanczos3);

    let data = encode_jpeg(&thumb, JPEG_QUALITY)?;
    if data.len() > MAX_THUMBNAIL_BYTES {
        // one retry at lower quality, no further shrinking
        return encode_jpeg(&thumb, JPEG_FALLBACK_QUALITY);
    }
    Ok(data)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoverError> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    img.write_with_encoder(encoder)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x + y) * 3 % 256) as u8,
            ])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn assert_thumbnail(data: &[u8]) {
        // baseline JPEG magic
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
        let decoded = image::load_from_memory(data).unwrap();
        assert_eq!(decoded.dimensions(), (THUMBNAIL_EDGE_PX, THUMBNAIL_EDGE_PX));
        assert!(data.len() <= MAX_THUMBNAIL_BYTES);
    }

    #[test]
    fn test_transform_square_source() {
        let data = transform(&png_bytes(300, 300)).unwrap();
        assert_thumbnail(&data);
    }

    #[test]
    fn test_transform_landscape_source() {
        let data = transform(&png_bytes(640, 360)).unwrap();
        assert_thumbnail(&data);
    }

    #[test]
    fn test_transform_portrait_source() {
        let data = transform(&png_bytes(360, 640)).unwrap();
        assert_thumbnail(&data);
    }

    #[test]
    fn test_transform_tiny_source_upscales() {
        let data = transform(&png_bytes(40, 20)).unwrap();
        assert_thumbnail(&data);
    }

    #[test]
    fn test_transform_rejects_garbage() {
        assert!(matches!(
            transform(b"definitely not an image"),
            Err(CoverError::Image(_))
        ));
    }

    #[tokio::test]
    async fn test_build_thumbnail_bad_url_is_none() {
        let transformer = CoverTransformer::new();
        // connection refused, not a panic and not an error to the caller
        let result = transformer
            .build_thumbnail("http://127.0.0.1:1/cover.jpg")
            .await;
        assert!(result.is_none());
    }
}
