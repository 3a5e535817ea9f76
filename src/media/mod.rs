//! Image payloads, transfer encodings and JPEG export.

pub mod export;
mod types;

pub use export::{jpeg_data_url, save_jpeg, to_jpeg, DEFAULT_DOWNLOAD_NAME};
pub use types::{EncodedImage, ImageFormat};
