//! Thumbnail generator backed by the `image` crate.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgb, RgbImage};

use autothumb_core::error::{AppError, ErrorKind};
use autothumb_core::result::AppResult;
use autothumb_core::traits::renderer::ThumbnailRenderer;
use autothumb_core::types::thumbnail::{OutputFormat, ThumbnailArtifact, ThumbnailConfig};

use super::geometry;

/// Source formats that can be thumbnailed.
pub const SUPPORTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Generates thumbnails from encoded image bytes.
///
/// The resampling filter is fixed per generator (Lanczos3 by default) so
/// output pixels are reproducible for the same input and configuration.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    /// Resampling filter.
    filter: FilterType,
    /// JPEG quality, 1..=100.
    jpeg_quality: u8,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            jpeg_quality: 85,
        }
    }
}

impl ThumbnailGenerator {
    /// Create a generator with the default filter and quality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a decoded format is supported for thumbnailing.
    pub fn is_supported(format: ImageFormat) -> bool {
        SUPPORTED_FORMATS.contains(&format)
    }

    /// Decode, resize, and encode on the current thread.
    pub fn render_blocking(
        &self,
        data: &[u8],
        config: &ThumbnailConfig,
        format: OutputFormat,
    ) -> AppResult<ThumbnailArtifact> {
        let source = Self::decode(data)?;
        let plan = geometry::plan(
            (source.width(), source.height()),
            config.target_size(),
            config.resize_mode(),
        );

        let cropped = match plan.crop {
            Some(crop) => source.crop_imm(crop.x, crop.y, crop.width, crop.height),
            None => source,
        };
        let (width, height) = plan.resize_to;
        let resized = if (width, height) == (cropped.width(), cropped.height()) {
            cropped
        } else {
            cropped.resize_exact(width, height, self.filter)
        };

        let bytes = self.encode(&resized, format)?;

        tracing::debug!(
            width,
            height,
            mode = %config.resize_mode(),
            format = format.mime_type(),
            bytes = bytes.len(),
            "Rendered thumbnail"
        );

        Ok(ThumbnailArtifact {
            bytes: Bytes::from(bytes),
            width,
            height,
            format,
        })
    }

    /// Decode bytes, rejecting formats outside [`SUPPORTED_FORMATS`], and
    /// apply the EXIF orientation.
    fn decode(data: &[u8]) -> AppResult<DynamicImage> {
        if data.is_empty() {
            return Err(AppError::decode("Empty image data"));
        }

        let format = image::guess_format(data).map_err(|e| {
            AppError::with_source(ErrorKind::Decode, "Unrecognized image data", e)
        })?;
        if !Self::is_supported(format) {
            return Err(AppError::unsupported_format(format!(
                "Image format {format:?} is not supported for thumbnails"
            )));
        }

        let mut decoder = ImageReader::with_format(Cursor::new(data), format)
            .into_decoder()
            .map_err(|e| AppError::with_source(ErrorKind::Decode, "Failed to read image", e))?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder)
            .map_err(|e| AppError::with_source(ErrorKind::Decode, "Failed to decode image", e))?;
        image.apply_orientation(orientation);
        Ok(image)
    }

    fn encode(&self, image: &DynamicImage, format: OutputFormat) -> AppResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encode_err =
            |e: image::ImageError| AppError::with_source(ErrorKind::Internal, "Failed to encode thumbnail", e);

        let flattened;
        let image = if image.color().has_alpha() && !format.supports_alpha() {
            flattened = DynamicImage::ImageRgb8(flatten_onto_white(image));
            &flattened
        } else {
            image
        };

        match format {
            OutputFormat::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                encoder.encode_image(&image.to_rgb8()).map_err(encode_err)?;
            }
            OutputFormat::Png => {
                let image = match image {
                    DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                        DynamicImage::ImageRgba16(image.to_rgba16())
                    }
                    other => other.clone(),
                };
                image
                    .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                    .map_err(encode_err)?;
            }
            OutputFormat::WebP => {
                // The WebP encoder only takes 8-bit RGB(A).
                let image = if image.color().has_alpha() {
                    DynamicImage::ImageRgba8(image.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                };
                image
                    .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
                    .map_err(encode_err)?;
            }
        }
        Ok(buf)
    }
}

#[async_trait]
impl ThumbnailRenderer for ThumbnailGenerator {
    async fn render(
        &self,
        source: Bytes,
        config: &ThumbnailConfig,
        format: OutputFormat,
    ) -> AppResult<ThumbnailArtifact> {
        let generator = self.clone();
        let config = config.clone();

        tokio::task::spawn_blocking(move || generator.render_blocking(&source, &config, format))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e))?
    }
}

/// Composite an image with alpha over an opaque white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
