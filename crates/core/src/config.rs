use std::env;
use std::time::Duration;
use crate::error::{AppError, Result};
use dotenvy::dotenv;

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: String,
    pub image_model: String,
    pub video_model: String,
    pub poll_interval: Duration,
    /// `None` polls until the job reports done.
    pub max_poll_checks: Option<u32>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .map_err(|_| AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let mut builder = Self::builder().with_api_key(api_key);

        if let Ok(model) = env::var("PROMO_IMAGE_MODEL") {
            builder = builder.with_image_model(model);
        }
        if let Ok(model) = env::var("PROMO_VIDEO_MODEL") {
            builder = builder.with_video_model(model);
        }
        if let Ok(secs) = env::var("PROMO_POLL_INTERVAL_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| {
                    AppError::config(format!("PROMO_POLL_INTERVAL_SECS is not a number: {secs}"))
                })?;
            builder = builder.with_poll_interval(Duration::from_secs(secs));
        }
        if let Ok(checks) = env::var("PROMO_MAX_POLL_CHECKS") {
            let checks: u32 = checks
                .trim()
                .parse()
                .map_err(|_| {
                    AppError::config(format!("PROMO_MAX_POLL_CHECKS is not a number: {checks}"))
                })?;
            builder = builder.with_max_poll_checks(checks);
        }

        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Programmatic construction of a [`Config`], used by tests and CLI overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    image_model: Option<String>,
    video_model: Option<String>,
    poll_interval: Option<Duration>,
    max_poll_checks: Option<u32>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = Some(model.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_max_poll_checks(mut self, checks: u32) -> Self {
        self.max_poll_checks = Some(checks);
        self
    }

    pub fn build(self) -> Result<Config> {
        let gemini_api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(AppError::config("poll interval must be greater than zero"));
        }
        if self.max_poll_checks == Some(0) {
            return Err(AppError::config("max poll checks must be at least 1"));
        }

        Ok(Config {
            gemini_api_key,
            image_model: self.image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            video_model: self.video_model.unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
            poll_interval,
            max_poll_checks: self.max_poll_checks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = Config::builder().with_api_key("k").build().unwrap();
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.video_model, DEFAULT_VIDEO_MODEL);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_poll_checks, None);
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = Config::builder().build().unwrap_err();
        assert!(matches!(err, AppError::MissingEnvVar(_)));

        let err = Config::builder().with_api_key("   ").build().unwrap_err();
        assert!(matches!(err, AppError::MissingEnvVar(_)));
    }

    #[test]
    fn zero_check_limit_is_rejected() {
        let err = Config::builder()
            .with_api_key("k")
            .with_max_poll_checks(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
