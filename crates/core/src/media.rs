//! Product image encoding.
//!
//! Uploads are read fully, base64-encoded for transport to the Gemini API and
//! tagged with their MIME type. No pixel processing happens here; the bytes
//! go to the provider exactly as the user supplied them.

use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::ImageFormat;
use std::path::Path;

/// Advisory upload limit. Larger files are accepted with a warning.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME types the wizard accepts for product uploads.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// An uploaded product photo in transport-ready form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    /// Base64 (standard alphabet, padded) encoding of the file bytes.
    pub data: String,
    pub mime_type: String,
}

impl ProductImage {
    /// Decodes the transport payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.data)
            .map_err(|e| AppError::encoding(format!("invalid base64 payload: {}", e)))
    }
}

/// Reads an image file from disk and encodes it.
///
/// # Errors
///
/// Returns [`AppError::Encoding`] if the file cannot be read or is empty, and
/// [`AppError::UnsupportedMedia`] if it is neither PNG nor JPEG.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<ProductImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::encoding(format!("failed to read {}: {}", path.display(), e)))?;

    let mime_type = detect_mime(&bytes, path)?;
    encode_bytes(&bytes, mime_type)
}

/// Encodes an in-memory upload with a known MIME type.
pub fn encode_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<ProductImage> {
    let mime_type = mime_type.into();
    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AppError::UnsupportedMedia(mime_type));
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        tracing::warn!(
            size = bytes.len(),
            limit = MAX_UPLOAD_BYTES,
            "product image exceeds the advisory upload size"
        );
    }

    let data = BASE64.encode(bytes);
    if data.is_empty() {
        return Err(AppError::encoding("file is empty"));
    }

    Ok(ProductImage { data, mime_type })
}

/// Determines the MIME type from the file content, then from its extension.
fn detect_mime(bytes: &[u8], path: &Path) -> Result<&'static str> {
    let format = image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok());

    match format {
        Some(ImageFormat::Png) => Ok("image/png"),
        Some(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Some(other) => Err(AppError::UnsupportedMedia(format!("{:?}", other))),
        None if bytes.is_empty() => Err(AppError::encoding("file is empty")),
        None => Err(AppError::UnsupportedMedia(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("promo-media-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn encodes_jpeg_and_keeps_mime() {
        let mut bytes = JPEG_MAGIC.to_vec();
        bytes.resize(2048, 0x42);
        let path = temp_file("product.jpg", &bytes);

        let image = encode_file(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert!(!image.data.is_empty());
        assert_eq!(image.decode().unwrap(), bytes);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn content_wins_over_extension() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        let path = temp_file("mislabelled.jpg", &bytes);

        let image = encode_file(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/png");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn empty_file_is_an_encoding_error() {
        let path = temp_file("empty.png", &[]);
        let err = encode_file(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Encoding(_)));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_an_encoding_error() {
        let err = encode_file("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, AppError::Encoding(_)));
    }

    #[test]
    fn rejects_other_mime_types() {
        let err = encode_bytes(b"GIF89a", "image/gif").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMedia(_)));
    }

    #[test]
    fn empty_bytes_are_rejected() {
        let err = encode_bytes(&[], "image/png").unwrap_err();
        assert!(matches!(err, AppError::Encoding(_)));
    }
}
