//! Image and video generation on top of a [`GenerationProvider`].
//!
//! [`GenerationClient`] owns the prompts, the response scanning and the
//! video polling protocol. The provider trait covers only the raw remote
//! calls, so the whole lifecycle can be driven against a scripted provider
//! in tests.
//!
//! # Video lifecycle
//!
//! ```text
//! Started -> submit job -> Submitted -> [Polling{n} -> wait -> status]* -> Finalizing -> download
//! ```
//!
//! Progress is reported as [`ProgressEvent`]s on an unbounded channel; the
//! caller decides how to display them.

use crate::blob::{BlobStore, BlobUrl};
use crate::catalog::{Model, Vibe};
use crate::config::{Config, DEFAULT_POLL_INTERVAL};
use crate::error::{AppError, Result};
use crate::media::ProductImage;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const FALLBACK_CAPTION: &str = "Check out this amazing product!";
pub const VIDEO_ASPECT_RATIO: &str = "9:16";
pub const VIDEO_MIME_TYPE: &str = "video/mp4";
const GENERATED_IMAGE_MIME: &str = "image/png";

/// Output kinds requested from a content generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Image,
    Text,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Image => "IMAGE",
            Modality::Text => "TEXT",
        }
    }
}

/// One multimodal request: instruction text plus an inline image.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub prompt: String,
    pub image: ProductImage,
    pub modalities: Vec<Modality>,
}

/// A typed part of a content generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    InlineData { mime_type: String, data: String },
    Text(String),
}

/// Image-to-video job submission.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    /// Base64 image bytes.
    pub image_data: String,
    pub image_mime_type: String,
    pub aspect_ratio: String,
    pub number_of_videos: u32,
}

/// A generated video as reported by a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub uri: Option<String>,
}

/// Snapshot of an asynchronous video job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoOperation {
    /// Opaque handle used to poll the job.
    pub name: String,
    pub done: bool,
    pub videos: Vec<GeneratedVideo>,
    /// Provider-side failure of a finished job.
    pub error: Option<String>,
}

/// Raw remote operations of a generative-media provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate_content(&self, request: ContentRequest) -> Result<Vec<ResponsePart>>;

    /// Submits a video job and returns its handle without waiting.
    async fn submit_video(&self, request: VideoRequest) -> Result<VideoOperation>;

    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation>;

    /// Fetches the binary content behind a locator, adding credentials.
    async fn download(&self, locator: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: GenerationProvider + ?Sized> GenerationProvider for Arc<T> {
    async fn generate_content(&self, request: ContentRequest) -> Result<Vec<ResponsePart>> {
        (**self).generate_content(request).await
    }

    async fn submit_video(&self, request: VideoRequest) -> Result<VideoOperation> {
        (**self).submit_video(request).await
    }

    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        (**self).get_video_operation(operation).await
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        (**self).download(locator).await
    }
}

/// The generated still image, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    pub image: GeneratedImage,
    pub caption: String,
}

/// A downloaded video, held locally in the [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub url: BlobUrl,
    /// The provider locator the bytes were fetched from.
    pub source_locator: String,
    pub size: usize,
}

/// Lifecycle notifications emitted while a video is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started,
    /// The job was accepted; polling starts next.
    Submitted,
    /// Emitted before each wait, `check` counts from 1.
    Polling { check: u32 },
    Finalizing,
}

impl ProgressEvent {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started => f.write_str("Starting video generation..."),
            ProgressEvent::Submitted => {
                f.write_str("Video job submitted. Waiting for the render to start...")
            }
            ProgressEvent::Polling { check } => write!(
                f,
                "Rendering video... (check {}) This can take a few minutes.",
                check
            ),
            ProgressEvent::Finalizing => f.write_str("Finishing the video..."),
        }
    }
}

/// How the video job is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the job reports done.
    pub max_checks: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_checks: None,
        }
    }
}

impl From<&Config> for PollPolicy {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_checks: config.max_poll_checks,
        }
    }
}

pub struct GenerationClient<P> {
    provider: P,
    policy: PollPolicy,
    blobs: BlobStore,
}

impl<P: GenerationProvider> GenerationClient<P> {
    pub fn new(provider: P, policy: PollPolicy, blobs: BlobStore) -> Self {
        Self {
            provider,
            policy,
            blobs,
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Renders `model` into the product photo in the style of `vibe`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageGeneration`] if the request fails or the
    /// response carries no inline image. The provider error is logged.
    pub async fn generate_image(
        &self,
        product: &ProductImage,
        model: &Model,
        vibe: &Vibe,
    ) -> Result<ImageResult> {
        let request = ContentRequest {
            prompt: image_prompt(model, vibe),
            image: product.clone(),
            modalities: vec![Modality::Image, Modality::Text],
        };

        info!(model = model.name, vibe = vibe.name, "requesting promotional image");

        let parts = self.provider.generate_content(request).await.map_err(|e| {
            error!(error = %e, "image generation request failed");
            match e {
                AppError::ImageGeneration(_) => e,
                other => AppError::image(other.to_string()),
            }
        })?;

        scan_image_parts(parts).ok_or_else(|| {
            error!("image generation response contained no image data");
            AppError::image("no image data returned")
        })
    }

    /// Animates the generated still and returns the downloaded video.
    ///
    /// Every event goes to `progress`; a closed receiver is not an error.
    ///
    /// # Errors
    ///
    /// - [`AppError::VideoLinkMissing`] if the finished job has no video uri
    /// - [`AppError::VideoDownload`] if fetching the video fails
    /// - [`AppError::VideoTimeout`] if the check limit is reached
    /// - [`AppError::Cancelled`] if `cancel` fires
    /// - [`AppError::VideoGeneration`] for any other provider failure
    pub async fn generate_video(
        &self,
        image: &GeneratedImage,
        vibe: &Vibe,
        progress: &UnboundedSender<ProgressEvent>,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset> {
        let emit = |event: ProgressEvent| {
            let _ = progress.send(event);
        };

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        emit(ProgressEvent::Started);
        let request = VideoRequest {
            prompt: video_prompt(vibe),
            image_data: image.data.clone(),
            image_mime_type: GENERATED_IMAGE_MIME.to_string(),
            aspect_ratio: VIDEO_ASPECT_RATIO.to_string(),
            number_of_videos: 1,
        };

        let mut operation = self
            .provider
            .submit_video(request)
            .await
            .map_err(video_failure)?;
        info!(operation = %operation.name, "video job submitted");
        emit(ProgressEvent::Submitted);

        let mut checks = 0u32;
        while !operation.done {
            if let Some(max) = self.policy.max_checks {
                if checks >= max {
                    error!(operation = %operation.name, checks, "video job exceeded check limit");
                    return Err(AppError::VideoTimeout { checks });
                }
            }

            checks += 1;
            emit(ProgressEvent::Polling { check: checks });

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(operation = %operation.name, checks, "video generation cancelled");
                    return Err(AppError::Cancelled);
                }
                _ = tokio::time::sleep(self.policy.interval) => {}
            }

            operation = self
                .provider
                .get_video_operation(&operation)
                .await
                .map_err(video_failure)?;
            debug!(operation = %operation.name, checks, done = operation.done, "polled video job");
        }

        emit(ProgressEvent::Finalizing);

        if let Some(message) = operation.error.take() {
            error!(
                operation = %operation.name,
                error = %message,
                "video job finished with an error"
            );
            return Err(AppError::video(message));
        }

        let locator = operation
            .videos
            .into_iter()
            .next()
            .and_then(|video| video.uri)
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                error!(operation = %operation.name, "finished video job has no download link");
                AppError::VideoLinkMissing
            })?;

        let bytes = self.provider.download(&locator).await.map_err(|e| {
            error!(error = %e, "video download failed");
            match e {
                AppError::VideoDownload(_) => e,
                other => AppError::VideoDownload(other.to_string()),
            }
        })?;

        let size = bytes.len();
        let url = self.blobs.create(bytes, VIDEO_MIME_TYPE);
        info!(size, url = %url, "video downloaded");

        Ok(VideoAsset {
            url,
            source_locator: locator,
            size,
        })
    }
}

fn video_failure(e: AppError) -> AppError {
    match e {
        AppError::Cancelled | AppError::VideoGeneration(_) => e,
        other => {
            error!(error = %other, "video generation request failed");
            AppError::video(other.to_string())
        }
    }
}

/// Picks the first inline image and the first non-empty text part.
fn scan_image_parts(parts: Vec<ResponsePart>) -> Option<ImageResult> {
    let mut image = None;
    let mut caption = None;

    for part in parts {
        match part {
            ResponsePart::InlineData { mime_type, data } if image.is_none() && !data.is_empty() => {
                image = Some(GeneratedImage { data, mime_type });
            }
            ResponsePart::Text(text) if caption.is_none() && !text.is_empty() => {
                caption = Some(clean_caption(&text));
            }
            _ => {}
        }
    }

    let caption = caption
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FALLBACK_CAPTION.to_string());

    image.map(|image| ImageResult { image, caption })
}

/// Drops markdown emphasis markers.
fn clean_caption(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

pub fn image_prompt(model: &Model, vibe: &Vibe) -> String {
    format!(
        "Using this product image, add a realistic model named '{name}', who is {description}. \
         The model should present the product naturally. The overall scene must have a \
         '{vibe}' aesthetic, following this direction: \"{direction}\". The final image must be \
         a high-quality promotional photo in a 9:16 portrait aspect ratio, suitable for a short \
         social video. Also write a short, catchy caption for this product.",
        name = model.name,
        description = model.description,
        vibe = vibe.name,
        direction = vibe.prompt,
    )
}

pub fn video_prompt(vibe: &Vibe) -> String {
    format!(
        "Create a short, dynamic 5-second promotional video based on this image. The video \
         should have a {vibe} feel ({direction}). Animate the scene with subtle motion, such as \
         the model shifting slightly, a gentle zoom or a light flicker. Keep the focus on the \
         product.",
        vibe = vibe.name,
        direction = vibe.prompt,
    )
}
