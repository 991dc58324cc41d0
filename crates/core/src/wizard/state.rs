//! Wizard state types.
//!
//! [`Session`] is the single source of truth for the active wizard. It is
//! only changed through `Session::apply`, so every value of
//! it the presentation layer observes is a complete snapshot.

use crate::catalog::{self, MODELS, Model, VIBES, Vibe};
use crate::generation::{GeneratedImage, VideoAsset};
use crate::media::ProductImage;
use std::fmt;

/// The five wizard steps, in the order they are visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    #[default]
    UploadProduct,
    SelectModel,
    SelectVibe,
    Generating,
    ShowResults,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::UploadProduct,
        WizardStep::SelectModel,
        WizardStep::SelectVibe,
        WizardStep::Generating,
        WizardStep::ShowResults,
    ];

    /// Zero-based position, for step indicators.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label shown in the progress indicator.
    pub fn label(self) -> &'static str {
        match self {
            WizardStep::UploadProduct => "Product",
            WizardStep::SelectModel => "Model",
            WizardStep::SelectVibe => "Vibe",
            WizardStep::Generating => "Process",
            WizardStep::ShowResults => "Result",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::UploadProduct => "UploadProduct",
            WizardStep::SelectModel => "SelectModel",
            WizardStep::SelectVibe => "SelectVibe",
            WizardStep::Generating => "Generating",
            WizardStep::ShowResults => "ShowResults",
        };
        f.write_str(name)
    }
}

/// Artifacts of one generation cycle.
///
/// Image and caption arrive together; the video only after the image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    pub image: Option<GeneratedImage>,
    pub video: Option<VideoAsset>,
    pub caption: Option<String>,
}

impl GeneratedContent {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none() && self.caption.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.image.is_some() && self.video.is_some() && self.caption.is_some()
    }
}

/// The aggregate state of the single active wizard session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) step: WizardStep,
    pub(crate) product_image: Option<ProductImage>,
    pub(crate) selected_model: Option<Model>,
    pub(crate) selected_vibe: Option<Vibe>,
    pub(crate) generated_content: GeneratedContent,
    pub(crate) is_loading: bool,
    pub(crate) loading_message: String,
    pub(crate) error: Option<String>,
    pub(crate) search_query: String,
}

impl Session {
    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn product_image(&self) -> Option<&ProductImage> {
        self.product_image.as_ref()
    }

    pub fn selected_model(&self) -> Option<&Model> {
        self.selected_model.as_ref()
    }

    pub fn selected_vibe(&self) -> Option<&Vibe> {
        self.selected_vibe.as_ref()
    }

    pub fn generated_content(&self) -> &GeneratedContent {
        &self.generated_content
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Catalog models matching the current search query.
    pub fn filtered_models(&self) -> Vec<&'static Model> {
        catalog::filter_models(MODELS, &self.search_query)
    }

    /// Borrows exactly what the screen for the current step needs.
    pub fn view(&self) -> View<'_> {
        match self.step {
            WizardStep::UploadProduct => View::UploadProduct {
                error: self.error(),
                is_loading: self.is_loading,
            },
            WizardStep::SelectModel => View::SelectModel {
                models: self.filtered_models(),
                search_query: &self.search_query,
            },
            WizardStep::SelectVibe => View::SelectVibe {
                model: self.selected_model.as_ref(),
                vibes: VIBES,
            },
            WizardStep::Generating => View::Generating {
                loading_message: &self.loading_message,
            },
            WizardStep::ShowResults => View::ShowResults {
                content: &self.generated_content,
            },
        }
    }
}

/// What the presentation layer renders for each step.
#[derive(Debug, PartialEq, Eq)]
pub enum View<'a> {
    UploadProduct {
        error: Option<&'a str>,
        is_loading: bool,
    },
    SelectModel {
        models: Vec<&'static Model>,
        search_query: &'a str,
    },
    SelectVibe {
        model: Option<&'a Model>,
        vibes: &'static [Vibe],
    },
    Generating {
        loading_message: &'a str,
    },
    ShowResults {
        content: &'a GeneratedContent,
    },
}
