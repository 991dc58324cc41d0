//! Wizard events and the transition function.

use super::state::{Session, WizardStep};
use crate::catalog::{Model, Vibe};
use crate::error::{AppError, Result};
use crate::generation::{ImageResult, VideoAsset};
use crate::media::ProductImage;

pub const MISSING_SELECTION_MESSAGE: &str = "The product image or selected model is missing.";

/// Everything that can happen to a wizard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// A file was picked and is being encoded.
    UploadStarted,
    ProductUploaded(ProductImage),
    UploadFailed(String),
    SearchChanged(String),
    ModelSelected(Model),
    /// Starts generation.
    VibeSelected(Vibe),
    /// Generation was triggered without a product image or model.
    SelectionMissing,
    LoadingMessage(String),
    ImageGenerated(ImageResult),
    VideoGenerated(VideoAsset),
    GenerationFailed(String),
    StartOver,
}

impl WizardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WizardEvent::UploadStarted => "UploadStarted",
            WizardEvent::ProductUploaded(_) => "ProductUploaded",
            WizardEvent::UploadFailed(_) => "UploadFailed",
            WizardEvent::SearchChanged(_) => "SearchChanged",
            WizardEvent::ModelSelected(_) => "ModelSelected",
            WizardEvent::VibeSelected(_) => "VibeSelected",
            WizardEvent::SelectionMissing => "SelectionMissing",
            WizardEvent::LoadingMessage(_) => "LoadingMessage",
            WizardEvent::ImageGenerated(_) => "ImageGenerated",
            WizardEvent::VideoGenerated(_) => "VideoGenerated",
            WizardEvent::GenerationFailed(_) => "GenerationFailed",
            WizardEvent::StartOver => "StartOver",
        }
    }
}

impl Session {
    /// Returns the session that results from `event`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidTransition`] when the current step does not
    /// accept `event`; `self` is left as it was.
    pub fn apply(&self, event: WizardEvent) -> Result<Session> {
        use WizardEvent as E;
        use WizardStep as S;

        let mut next = self.clone();
        match (self.step, event) {
            (_, E::StartOver) => return Ok(Session::default()),

            (_, E::SearchChanged(query)) => next.search_query = query,

            (S::UploadProduct, E::UploadStarted) => {
                next.is_loading = true;
                next.error = None;
            }
            (S::UploadProduct, E::ProductUploaded(image)) => {
                next.product_image = Some(image);
                next.step = S::SelectModel;
                next.is_loading = false;
                next.error = None;
            }
            (S::UploadProduct, E::UploadFailed(message)) => {
                next.is_loading = false;
                next.error = Some(message);
            }

            (S::SelectModel, E::ModelSelected(model)) => {
                next.selected_model = Some(model);
                next.step = S::SelectVibe;
            }

            (S::SelectVibe, E::VibeSelected(vibe)) => {
                next.selected_vibe = Some(vibe);
                next.step = S::Generating;
                next.is_loading = true;
                next.loading_message.clear();
                next.error = None;
            }

            (S::Generating, E::SelectionMissing) => {
                next.step = S::UploadProduct;
                next.is_loading = false;
                next.loading_message.clear();
                next.error = Some(MISSING_SELECTION_MESSAGE.to_string());
            }
            (S::Generating, E::LoadingMessage(message)) => next.loading_message = message,
            (S::Generating, E::ImageGenerated(result)) => {
                next.generated_content.image = Some(result.image);
                next.generated_content.caption = Some(result.caption);
            }
            (S::Generating, E::VideoGenerated(asset)) if self.generated_content.image.is_some() => {
                next.generated_content.video = Some(asset);
                next.step = S::ShowResults;
                next.is_loading = false;
                next.loading_message.clear();
            }
            (S::Generating, E::GenerationFailed(message)) => {
                next = Session {
                    error: Some(message),
                    search_query: std::mem::take(&mut next.search_query),
                    ..Session::default()
                };
            }

            (step, event) => {
                return Err(AppError::InvalidTransition {
                    step: step.to_string(),
                    event: event.name().to_string(),
                });
            }
        }

        Ok(next)
    }
}
