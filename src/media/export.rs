//! Download artifacts: every thumbnail leaves the studio as a JPEG.

use crate::error::{Result, ThumbnailError};
use crate::media::types::{EncodedImage, ImageFormat};
use image::ImageEncoder;
use std::path::Path;

/// File name offered for downloads when the user does not pick one.
pub const DEFAULT_DOWNLOAD_NAME: &str = "thumbnail.jpg";

/// Quality used when transcoding PNG/WEBP results.
const JPEG_QUALITY: u8 = 92;

/// Returns the image as JPEG bytes.
///
/// JPEG payloads are returned untouched; anything else is decoded and
/// re-encoded. Alpha is flattened since JPEG has no transparency.
pub fn to_jpeg(image: &EncodedImage) -> Result<EncodedImage> {
    if image.format() == ImageFormat::Jpeg {
        return Ok(image.clone());
    }

    let source_format = match image.format() {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let decoded = image::load_from_memory_with_format(image.data(), source_format)
        .map_err(|e| ThumbnailError::Export(format!("failed to decode {}: {e}", image.format())))?;
    let rgb = decoded.to_rgb8();

    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ThumbnailError::Export(format!("failed to encode JPEG: {e}")))?;

    Ok(EncodedImage::new(out, ImageFormat::Jpeg))
}

/// Writes the thumbnail to `path` as a JPEG file.
pub fn save_jpeg(image: &EncodedImage, path: impl AsRef<Path>) -> Result<()> {
    let jpeg = to_jpeg(image)?;
    jpeg.save(path)?;
    Ok(())
}

/// Returns a `data:image/jpeg;base64,...` URL suitable for a download link.
pub fn jpeg_data_url(image: &EncodedImage) -> Result<String> {
    Ok(to_jpeg(image)?.to_data_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> EncodedImage {
        let buffer = image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 128]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        buffer
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        EncodedImage::new(bytes.into_inner(), ImageFormat::Png)
    }

    #[test]
    fn test_jpeg_passthrough() {
        let jpeg = EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], ImageFormat::Jpeg);
        assert_eq!(to_jpeg(&jpeg).unwrap(), jpeg);
    }

    #[test]
    fn test_png_is_transcoded() {
        let jpeg = to_jpeg(&tiny_png()).unwrap();
        assert_eq!(jpeg.format(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(jpeg.data()), Some(ImageFormat::Jpeg));

        let decoded = image::load_from_memory(jpeg.data()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_corrupt_png_fails_export() {
        let broken = EncodedImage::new(vec![0x89, 0x50, 0x4E, 0x47, 0, 0], ImageFormat::Png);
        assert!(matches!(to_jpeg(&broken), Err(ThumbnailError::Export(_))));
    }

    #[test]
    fn test_jpeg_data_url_prefix() {
        let url = jpeg_data_url(&tiny_png()).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }
}
