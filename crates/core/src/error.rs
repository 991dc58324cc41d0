//! Error types for the promo-studio-core library.
//!
//! Each variant keeps its diagnostic detail for logging, while
//! [`AppError::user_message`] gives the short text that is safe to show in
//! the wizard.

use thiserror::Error;

/// Errors that can occur within the promo-studio-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// The uploaded file could not be read or encoded.
    #[error("Could not encode product image: {0}")]
    Encoding(String),

    /// The uploaded file is not a PNG or JPEG image.
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// Generation was attempted without a product image or model.
    #[error("Missing selection: {0}")]
    MissingSelection(String),

    /// The provider failed or returned no image payload.
    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    /// The video job completed without a retrievable asset.
    #[error("Video generation finished but no download link was provided")]
    VideoLinkMissing,

    /// Fetching the finished video failed.
    #[error("Failed to download video: {0}")]
    VideoDownload(String),

    /// The provider failed while submitting or polling the video job.
    #[error("Video generation failed: {0}")]
    VideoGeneration(String),

    /// The video job was still running after the configured number of checks.
    #[error("Video generation did not finish after {checks} checks")]
    VideoTimeout { checks: u32 },

    /// The generation was cancelled by the caller.
    #[error("Generation cancelled")]
    Cancelled,

    /// Catch-all for unexpected provider or network failures.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The wizard received an event its current step does not accept.
    #[error("Event '{event}' is not valid in step {step}")]
    InvalidTransition { step: String, event: String },

    /// Export was requested for an artifact that does not exist.
    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A locator could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an encoding error with the given message.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Creates an image generation error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageGeneration(msg.into())
    }

    /// Creates a video generation error with the given message.
    pub fn video(msg: impl Into<String>) -> Self {
        Self::VideoGeneration(msg.into())
    }

    /// Creates a catch-all generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Returns the generic message shown to the user for this error.
    ///
    /// Provider and network detail never appears here; callers are expected
    /// to log the full error separately.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::MissingEnvVar(_) => {
                "The application is not configured. Check your API key."
            }
            Self::Encoding(_) | Self::Io(_) => {
                "Could not process the file. Please try another image."
            }
            Self::UnsupportedMedia(_) => "Please upload a PNG or JPEG image.",
            Self::MissingSelection(_) => "The product image or selected model is missing.",
            Self::ImageGeneration(_) => "Failed to generate the image. Please try again.",
            Self::VideoLinkMissing
            | Self::VideoDownload(_)
            | Self::VideoGeneration(_)
            | Self::VideoTimeout { .. } => "Failed to generate the video. Please try again.",
            Self::Cancelled => "Generation was cancelled.",
            Self::InvalidTransition { .. } => "That action is not available right now.",
            Self::NothingToExport(_) => "There is nothing to download yet.",
            Self::Generation(_) | Self::Json(_) | Self::Url(_) => {
                "An unknown error occurred while generating content."
            }
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
