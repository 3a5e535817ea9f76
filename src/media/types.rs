//! Image payloads and their transfer encodings.

use crate::error::{Result, ThumbnailError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted as subject input and returned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy). Thumbnails are delivered in this format.
    #[default]
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Parses a MIME type such as `image/png`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Raw image bytes paired with their media type.
///
/// Used for the subject the user uploads, for every thumbnail the model
/// returns, and for the identity reference kept alongside history entries.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: Vec<u8>,
    format: ImageFormat,
}

impl EncodedImage {
    /// Wraps bytes with an explicit format.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Wraps bytes, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| {
            ThumbnailError::UnsupportedFormat("expected PNG, JPEG or WEBP data".into())
        })?;
        Ok(Self::new(data, format))
    }

    /// Reads a subject image from disk.
    ///
    /// The format comes from the file contents only; a PNG, JPEG or WEBP
    /// extension on other data is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(ThumbnailError::Validation(format!(
                "{} is empty",
                path.display()
            )));
        }

        let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| {
            ThumbnailError::UnsupportedFormat(format!(
                "{} is not a PNG, JPEG or WEBP image",
                path.display()
            ))
        })?;

        Ok(Self::new(data, format))
    }

    /// Decodes a base64 payload, tolerating a `data:` URL prefix.
    pub fn from_base64(payload: &str, mime_type: &str) -> Result<Self> {
        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| ThumbnailError::UnsupportedFormat(mime_type.to_string()))?;
        let data = decode_base64_lenient(payload)
            .map_err(|e| ThumbnailError::Decode(e.to_string()))?;
        Ok(Self::new(data, format))
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ThumbnailError::Decode("not a data URL".into()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ThumbnailError::Decode("data URL is not base64 encoded".into()))?;
        Self::from_base64(payload, mime)
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the payload.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64 (no data URL prefix).
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }

    /// Writes the bytes unchanged to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a data URL prefix (`data:image/png;base64,...`), embedded
/// whitespace, and missing `=` padding.
pub(crate) fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}
