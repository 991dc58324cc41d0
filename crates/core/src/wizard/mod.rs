//! The product-to-promo wizard.
//!
//! # Architecture
//!
//! The wizard is split into focused submodules:
//! - [`state`]: steps, the session aggregate and per-step views
//! - [`event`]: wizard events and the `(session, event) -> session` function
//!
//! [`Wizard`] drives a session through the generation client and publishes
//! every resulting snapshot on a `watch` channel:
//!
//! ```text
//! UploadProduct -> SelectModel -> SelectVibe -> Generating -> ShowResults
//!       ^                                            |              |
//!       +------------- failure ----------------------+   start over |
//!       +-----------------------------------------------------------+
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut wizard = Wizard::new(client);
//! wizard.upload_file("product.jpg").await?;
//! wizard.select_model(find_model("Chloe").unwrap())?;
//! wizard.select_vibe(find_vibe("Minimalis").unwrap()).await?;
//! ```

mod event;
mod state;

pub use event::{MISSING_SELECTION_MESSAGE, WizardEvent};
pub use state::{GeneratedContent, Session, View, WizardStep};

use crate::blob::BlobStore;
use crate::catalog::{Model, Vibe};
use crate::error::{AppError, Result};
use crate::generation::{GenerationClient, GenerationProvider};
use crate::media::{self, ProductImage};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const IMAGE_LOADING_MESSAGE: &str = "Generating promotional image...";
const IMAGE_DONE_MESSAGE: &str = "Image created! Starting video generation...";

/// The session plus the channel its snapshots are published on.
struct Published {
    session: Session,
    updates: watch::Sender<Session>,
}

impl Published {
    fn apply(&mut self, event: WizardEvent) -> Result<()> {
        let name = event.name();
        let next = self.session.apply(event)?;
        if next.step != self.session.step {
            info!(from = %self.session.step, to = %next.step, event = name, "wizard step changed");
        } else {
            debug!(step = %next.step, event = name, "wizard event applied");
        }
        self.session = next;
        self.updates.send_replace(self.session.clone());
        Ok(())
    }
}

/// A single wizard session bound to a generation client.
pub struct Wizard<P> {
    client: GenerationClient<P>,
    state: Published,
    cancel: CancellationToken,
}

impl<P: GenerationProvider> Wizard<P> {
    pub fn new(client: GenerationClient<P>) -> Self {
        Self::with_session(client, Session::default())
    }

    fn with_session(client: GenerationClient<P>, session: Session) -> Self {
        let (updates, _) = watch::channel(session.clone());
        Self {
            client,
            state: Published { session, updates },
            cancel: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.state.session
    }

    pub fn view(&self) -> View<'_> {
        self.state.session.view()
    }

    /// Receives a snapshot after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.updates.subscribe()
    }

    /// Token that aborts the generation in flight.
    ///
    /// Once it has fired, a fresh token replaces it before the next run, after
    /// the run it fired in, and on start over. Fetch it again before each
    /// generation.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn blobs(&self) -> &BlobStore {
        self.client.blobs()
    }

    /// Encodes the file at `path` and moves on to model selection.
    ///
    /// On failure the wizard stays on the upload step with the error shown.
    pub async fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.state.apply(WizardEvent::UploadStarted)?;
        let encoded = media::encode_file(path).await;
        self.finish_upload(encoded)
    }

    /// Same as [`Wizard::upload_file`] for bytes already in memory.
    pub fn upload_bytes(&mut self, bytes: &[u8], mime_type: &str) -> Result<()> {
        self.state.apply(WizardEvent::UploadStarted)?;
        let encoded = media::encode_bytes(bytes, mime_type);
        self.finish_upload(encoded)
    }

    fn finish_upload(&mut self, encoded: Result<ProductImage>) -> Result<()> {
        match encoded {
            Ok(image) => {
                info!(
                    mime = %image.mime_type,
                    encoded_len = image.data.len(),
                    "product image uploaded"
                );
                self.state.apply(WizardEvent::ProductUploaded(image))
            }
            Err(e) => {
                error!(error = %e, "product upload failed");
                self.state
                    .apply(WizardEvent::UploadFailed(e.user_message().to_string()))?;
                Err(e)
            }
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> Result<()> {
        self.state.apply(WizardEvent::SearchChanged(query.into()))
    }

    pub fn filtered_models(&self) -> Vec<&'static Model> {
        self.state.session.filtered_models()
    }

    pub fn select_model(&mut self, model: &Model) -> Result<()> {
        self.state.apply(WizardEvent::ModelSelected(model.clone()))
    }

    /// Selects `vibe` and runs the whole generation: image, then video.
    ///
    /// The session ends in `ShowResults` on success. On any failure it is
    /// back on `UploadProduct` with a generic error message, and the error is
    /// also returned.
    pub async fn select_vibe(&mut self, vibe: &Vibe) -> Result<()> {
        self.renew_fired_token();
        self.state.apply(WizardEvent::VibeSelected(vibe.clone()))?;

        let session = &self.state.session;
        let selection = (session.product_image.clone(), session.selected_model.clone());
        let (Some(product), Some(model)) = selection else {
            warn!("generation triggered without product image or model");
            self.state.apply(WizardEvent::SelectionMissing)?;
            return Err(AppError::MissingSelection(
                "product image and model are required".to_string(),
            ));
        };

        let outcome = self.generate(&product, &model, vibe).await;
        // Cancellation can land in a step that does not watch the token.
        self.renew_fired_token();

        match outcome {
            Ok(()) => {
                info!(model = model.name, vibe = vibe.name, "content generation finished");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "content generation failed");
                self.release_video();
                self.state
                    .apply(WizardEvent::GenerationFailed(e.user_message().to_string()))?;
                Err(e)
            }
        }
    }

    async fn generate(&mut self, product: &ProductImage, model: &Model, vibe: &Vibe) -> Result<()> {
        let client = &self.client;
        let state = &mut self.state;

        state.apply(WizardEvent::LoadingMessage(IMAGE_LOADING_MESSAGE.to_string()))?;
        let result = client.generate_image(product, model, vibe).await?;
        let still = result.image.clone();
        state.apply(WizardEvent::ImageGenerated(result))?;
        state.apply(WizardEvent::LoadingMessage(IMAGE_DONE_MESSAGE.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let video = client.generate_video(&still, vibe, &tx, &self.cancel);
        tokio::pin!(video);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => {
                    state.apply(WizardEvent::LoadingMessage(event.message()))?;
                }
                result = &mut video => break result,
            }
        };
        while let Ok(event) = rx.try_recv() {
            state.apply(WizardEvent::LoadingMessage(event.message()))?;
        }

        state.apply(WizardEvent::VideoGenerated(outcome?))
    }

    /// Discards the session and every artifact it produced.
    pub fn start_over(&mut self) -> Result<()> {
        self.release_video();
        self.cancel = CancellationToken::new();
        self.state.apply(WizardEvent::StartOver)
    }

    fn renew_fired_token(&mut self) {
        if self.cancel.is_cancelled() {
            debug!("replacing fired cancellation token");
            self.cancel = CancellationToken::new();
        }
    }

    fn release_video(&self) {
        if let Some(video) = &self.state.session.generated_content.video {
            if self.client.blobs().revoke(&video.url) {
                debug!(url = %video.url, "released video blob");
            }
        }
    }
}
