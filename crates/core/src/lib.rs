//! Promo Studio Core Library
//!
//! This library turns a product photo into promotional content: a still
//! image showing a virtual model with the product, a short video animated
//! from that still, and a caption. Generation is delegated to Google's
//! Gemini (image) and Veo (video) APIs.
//!
//! # Overview
//!
//! The library handles:
//!
//! - **Upload**: reading and base64-encoding product photos via [`media`]
//! - **Catalog**: the static models and vibes via [`catalog`]
//! - **Generation**: image requests and video job polling via [`generation`]
//! - **Wizard**: the step-by-step session state machine via [`wizard`]
//! - **Export**: saving the results to disk via [`export`]
//!
//! # Quick Start
//!
//! ```ignore
//! use promo_studio_core::{PromoStudio, catalog};
//!
//! let studio = PromoStudio::new()?;
//! let mut wizard = studio.wizard()?;
//!
//! wizard.upload_file("product.jpg").await?;
//! wizard.select_model(catalog::find_model("Chloe").unwrap())?;
//! wizard.select_vibe(catalog::find_vibe("Minimalis").unwrap()).await?;
//!
//! println!("{:?}", wizard.session().generated_content().caption);
//! ```
//!
//! # Module Structure
//!
//! - [`blob`]: In-memory store for downloaded videos
//! - [`catalog`]: Virtual models and vibes
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`export`]: Writing artifacts to disk
//! - [`gemini`]: Gemini/Veo provider
//! - [`generation`]: Generation client and polling
//! - [`media`]: Product image encoding
//! - [`wizard`]: Wizard state machine

pub mod blob;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod gemini;
pub mod generation;
pub mod media;
pub mod wizard;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use blob::{BlobStore, BlobUrl};
pub use catalog::{Model, Vibe};
pub use config::Config;
pub use error::{AppError, Result};
pub use gemini::GeminiProvider;
pub use generation::{GenerationClient, GenerationProvider, PollPolicy, ProgressEvent};
pub use wizard::{GeneratedContent, Session, View, Wizard, WizardStep};

/// Main entry point for Promo Studio.
///
/// Holds the configuration and builds wizards wired to the Gemini provider.
///
/// # Example
///
/// ```ignore
/// use promo_studio_core::PromoStudio;
///
/// let studio = PromoStudio::new()?;
/// let wizard = studio.wizard()?;
/// ```
pub struct PromoStudio {
    config: Config,
}

impl PromoStudio {
    /// Creates a new instance from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingEnvVar`] if no API key is configured.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self { config })
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Builds a fresh wizard session backed by Gemini and Veo.
    ///
    /// # Errors
    ///
    /// Returns an error if the Gemini client cannot be created.
    pub fn wizard(&self) -> Result<Wizard<GeminiProvider>> {
        let provider = GeminiProvider::new(&self.config)?;
        let policy = PollPolicy::from(&self.config);
        let client = GenerationClient::new(provider, policy, BlobStore::new());
        Ok(Wizard::new(client))
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    ///
    /// Changes apply to wizards built afterwards.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup. It loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
