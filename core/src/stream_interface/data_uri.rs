use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage, RgbaImage};

use crate::prelude::{ConsoleError, ConsoleResult};

const JPEG_PREFIX: &str = "data:image/jpeg;base64,";

/// Wraps encoded JPEG bytes as a `data:` URI.
pub fn encode_jpeg(bytes: &[u8]) -> String {
    let mut uri = String::with_capacity(JPEG_PREFIX.len() + bytes.len() * 4 / 3 + 4);
    uri.push_str(JPEG_PREFIX);
    uri.push_str(&BASE64_STANDARD.encode(bytes));
    uri
}

/// Extracts the raw payload from a base64 `data:` URI of any media type.
pub fn decode(uri: &str) -> ConsoleResult<Vec<u8>> {
    let (header, encoded) = uri
        .split_once(',')
        .ok_or_else(|| ConsoleError::InvalidMessage("data URI without payload".into()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(ConsoleError::InvalidMessage(format!(
            "unsupported data URI header {header}"
        )));
    }
    BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| ConsoleError::InvalidMessage(format!("bad base64 payload: {e}")))
}

/// Compresses `image` as JPEG and wraps it as a `data:` URI.
pub fn jpeg_from_rgb(image: &RgbImage, quality: u8) -> ConsoleResult<String> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ConsoleError::Encode(e.to_string()))?;
    Ok(encode_jpeg(&bytes))
}

/// Decodes an image `data:` URI (any format `image` recognises) to RGBA.
pub fn decode_image(uri: &str) -> ConsoleResult<RgbaImage> {
    let bytes = decode(uri)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| ConsoleError::InvalidMessage(format!("undecodable image: {e}")))?;
    Ok(image.to_rgba8())
}
