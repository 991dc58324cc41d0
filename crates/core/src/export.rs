//! Saving generated artifacts to disk.

use crate::blob::BlobStore;
use crate::error::{AppError, Result};
use crate::wizard::GeneratedContent;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};

pub const IMAGE_FILE_NAME: &str = "promo-image.png";
pub const VIDEO_FILE_NAME: &str = "promo-video.mp4";

/// Writes the generated still to `dir` as a PNG file.
pub async fn save_image(content: &GeneratedContent, dir: &Path) -> Result<PathBuf> {
    let image = content
        .image
        .as_ref()
        .ok_or_else(|| AppError::NothingToExport("no generated image".to_string()))?;

    let bytes = BASE64
        .decode(&image.data)
        .map_err(|e| AppError::encoding(format!("generated image is not valid base64: {}", e)))?;

    let path = dir.join(IMAGE_FILE_NAME);
    tokio::fs::write(&path, bytes).await?;
    tracing::info!(path = %path.display(), "saved promotional image");
    Ok(path)
}

/// Writes the downloaded video to `dir` as an MP4 file.
pub async fn save_video(
    content: &GeneratedContent,
    blobs: &BlobStore,
    dir: &Path,
) -> Result<PathBuf> {
    let video = content
        .video
        .as_ref()
        .ok_or_else(|| AppError::NothingToExport("no generated video".to_string()))?;

    let blob = blobs
        .get(&video.url)
        .ok_or_else(|| AppError::NothingToExport(format!("{} was released", video.url)))?;

    let path = dir.join(VIDEO_FILE_NAME);
    tokio::fs::write(&path, &*blob.bytes).await?;
    tracing::info!(path = %path.display(), size = blob.bytes.len(), "saved promotional video");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GeneratedImage, VideoAsset};

    fn out_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("promo-export-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn writes_both_artifacts() {
        let blobs = BlobStore::new();
        let url = blobs.create(b"MP4DATA".to_vec(), "video/mp4");
        let content = GeneratedContent {
            image: Some(GeneratedImage {
                data: BASE64.encode(b"PNGDATA"),
                mime_type: "image/png".to_string(),
            }),
            video: Some(VideoAsset {
                url,
                source_locator: "http://video/1".to_string(),
                size: 7,
            }),
            caption: Some("caption".to_string()),
        };
        let dir = out_dir("both");

        let image = save_image(&content, &dir).await.unwrap();
        let video = save_video(&content, &blobs, &dir).await.unwrap();
        assert_eq!(std::fs::read(&image).unwrap(), b"PNGDATA");
        assert_eq!(std::fs::read(&video).unwrap(), b"MP4DATA");
        assert!(video.ends_with(VIDEO_FILE_NAME));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn empty_content_has_nothing_to_export() {
        let dir = out_dir("empty");
        let content = GeneratedContent::default();
        assert!(matches!(
            save_image(&content, &dir).await,
            Err(AppError::NothingToExport(_))
        ));
        assert!(matches!(
            save_video(&content, &BlobStore::new(), &dir).await,
            Err(AppError::NothingToExport(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
