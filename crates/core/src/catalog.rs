//! Static catalog of virtual models and content vibes.

use serde::Serialize;

/// A virtual model persona the generator renders into the product scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub image_url: &'static str,
}

/// A stylistic preset whose prompt text is injected into generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vibe {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const MODELS: &[Model] = &[
    Model {
        id: "model1",
        name: "Chloe",
        description: "a friendly, approachable influencer with a natural look",
        image_url: "https://picsum.photos/seed/model1/400/600",
    },
    Model {
        id: "model2",
        name: "Alex",
        description: "a trendy, edgy model with a cool urban style",
        image_url: "https://picsum.photos/seed/model2/400/600",
    },
    Model {
        id: "model3",
        name: "Sophia",
        description: "an elegant, sophisticated model suited to luxury brands",
        image_url: "https://picsum.photos/seed/model3/400/600",
    },
    Model {
        id: "model4",
        name: "Leo",
        description: "a sporty, energetic model, great for fitness or activewear",
        image_url: "https://picsum.photos/seed/model4/400/600",
    },
];

pub const VIBES: &[Vibe] = &[
    Vibe {
        id: "vibe1",
        name: "Minimalis",
        description: "Clean, simple and elegant.",
        prompt: "Create a scene with a minimalist aesthetic, using neutral colors, clean lines and plenty of negative space. The mood should be calm and sophisticated.",
    },
    Vibe {
        id: "vibe2",
        name: "Vintage",
        description: "Nostalgic, warm and retro.",
        prompt: "Produce a scene with a vintage feel. Use faded warm colors, film grain and a retro style for the setting and the model's outfit. Think 70s or 80s nostalgia.",
    },
    Vibe {
        id: "vibe3",
        name: "Futuristik",
        description: "Sleek, modern and high-tech.",
        prompt: "Create a futuristic scene. Combine neon lights, holographic elements and sleek modern architecture. The mood should be high-tech and cutting-edge.",
    },
    Vibe {
        id: "vibe4",
        name: "Bohemian",
        description: "Free-spirited, natural and earthy.",
        prompt: "Design a bohemian-themed scene. Use earth tones, natural textures such as wood and macrame, and lots of plants. The model should look relaxed and free-spirited.",
    },
];

/// Narrows `models` to those whose name contains `query`, ignoring case.
///
/// An empty query keeps the whole catalog.
pub fn filter_models<'a>(models: &'a [Model], query: &str) -> Vec<&'a Model> {
    let needle = query.to_lowercase();
    models
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn find_model(name_or_id: &str) -> Option<&'static Model> {
    MODELS
        .iter()
        .find(|m| m.id == name_or_id || m.name.eq_ignore_ascii_case(name_or_id))
}

pub fn find_vibe(name_or_id: &str) -> Option<&'static Vibe> {
    VIBES
        .iter()
        .find(|v| v.id == name_or_id || v.name.eq_ignore_ascii_case(name_or_id))
}
