//! Decoding of inline `data:` URL images submitted by the design wizard.
//!
//! The client sends reference images and canvas drawings as
//! `data:<media-type>;base64,<payload>`. They are decoded to raw bytes and
//! sniffed by magic number before anything is persisted, so the stored
//! content type always reflects the actual bytes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;

/// Upper bound for a single decoded upload (10 MiB).
pub const MAX_DECODED_BYTES: usize = 10 * 1024 * 1024;

/// A decoded inline image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// MIME type derived from the decoded bytes, e.g. `image/png`.
    pub content_type: &'static str,
    /// Preferred file extension without the dot, e.g. `png`.
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a base64 data URL")]
    Malformed,

    #[error("declared media type '{0}' is not an image")]
    NotAnImage(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("decoded payload is empty")]
    Empty,

    #[error("decoded payload exceeds the 10 MiB limit")]
    TooLarge,

    #[error("decoded payload is not a recognised image format")]
    UnrecognisedFormat,
}

/// Decode a `data:image/...;base64,...` URL into a binary blob.
pub fn decode_image(data_url: &str) -> Result<DecodedImage, DataUrlError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUrlError::Malformed)?;
    let (media_type, payload) = rest.split_once(";base64,").ok_or(DataUrlError::Malformed)?;

    if !media_type.starts_with("image/") {
        return Err(DataUrlError::NotAnImage(media_type.to_string()));
    }

    // Rough pre-check so oversized payloads are rejected before allocation.
    if payload.len() / 4 * 3 > MAX_DECODED_BYTES + 3 {
        return Err(DataUrlError::TooLarge);
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| DataUrlError::InvalidBase64(e.to_string()))?;

    if bytes.is_empty() {
        return Err(DataUrlError::Empty);
    }
    if bytes.len() > MAX_DECODED_BYTES {
        return Err(DataUrlError::TooLarge);
    }

    let format = image::guess_format(&bytes).map_err(|_| DataUrlError::UnrecognisedFormat)?;
    let (content_type, extension) = describe_format(format)?;

    Ok(DecodedImage {
        content_type,
        extension,
        bytes,
    })
}

fn describe_format(format: ImageFormat) -> Result<(&'static str, &'static str), DataUrlError> {
    match format {
        ImageFormat::Png => Ok(("image/png", "png")),
        ImageFormat::Jpeg => Ok(("image/jpeg", "jpg")),
        ImageFormat::WebP => Ok(("image/webp", "webp")),
        ImageFormat::Gif => Ok(("image/gif", "gif")),
        _ => Err(DataUrlError::UnrecognisedFormat),
    }
}
