//! Model routing
//!
//! Maps a caller-supplied model id onto the provider, vendor model and
//! endpoint that serve it. Pure and deterministic: the table is static and
//! unknown ids fall back to the default text model instead of failing.

use crate::models::{CapabilityClass, ModelDescriptor, Provider};
use crate::templates;

/// Baseline text model used for unknown ids.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

struct ModelEntry {
    id: &'static str,
    vendor_model: &'static str,
    provider: Provider,
}

const fn entry(id: &'static str, vendor_model: &'static str, provider: Provider) -> ModelEntry {
    ModelEntry {
        id,
        vendor_model,
        provider,
    }
}

const TEXT_MODELS: &[ModelEntry] = &[
    entry("gemini-2.5-flash", "gemini-2.5-flash", Provider::VertexGemini),
    entry("gemini-2.5-pro", "gemini-2.5-pro", Provider::VertexGemini),
    entry("gemini-2.5-flash-lite", "gemini-2.5-flash-lite", Provider::VertexGemini),
    entry("gemini-2.0-flash", "gemini-2.0-flash", Provider::VertexGemini),
    entry("gemini-2.0-flash-lite", "gemini-2.0-flash-lite", Provider::VertexGemini),
    entry("gemini-1.5-pro", "gemini-1.5-pro-002", Provider::VertexGemini),
    entry("gemini-1.5-flash", "gemini-1.5-flash-002", Provider::VertexGemini),
    entry("gemini-flash-latest", "gemini-flash-latest", Provider::Gemini),
    entry("gemini-pro-latest", "gemini-pro-latest", Provider::Gemini),
];

const IMAGE_MODELS: &[ModelEntry] = &[
    entry("imagen-4", "imagen-4.0-generate-001", Provider::Imagen),
    entry("imagen-4-fast", "imagen-4.0-fast-generate-001", Provider::Imagen),
    entry("imagen-4-ultra", "imagen-4.0-ultra-generate-001", Provider::Imagen),
    entry("imagen-3", "imagen-3.0-generate-002", Provider::Imagen),
    entry("imagen-3-fast", "imagen-3.0-fast-generate-001", Provider::Imagen),
    entry("nanobanana", "gemini-2.5-flash-image", Provider::Gemini),
    entry("gemini-2.5-flash-image", "gemini-2.5-flash-image", Provider::Gemini),
    entry(
        "gemini-2.5-flash-image-preview",
        "gemini-2.5-flash-image-preview",
        Provider::Gemini,
    ),
    entry(
        "gemini-2.0-flash-preview-image-generation",
        "gemini-2.0-flash-preview-image-generation",
        Provider::Gemini,
    ),
    entry(
        "gemini-2.0-flash-exp-image",
        "gemini-2.0-flash-exp",
        Provider::LegacyGemini,
    ),
];

const VISION_MODELS: &[ModelEntry] = &[
    entry("gemini-pro-vision", "gemini-2.5-flash", Provider::VertexGemini),
    entry("gemini-2.5-flash-vision", "gemini-2.5-flash", Provider::VertexGemini),
];

const AUDIO_MODELS: &[ModelEntry] = &[
    entry(
        "gemini-2.5-flash-native-audio",
        "gemini-2.5-flash-native-audio-preview-09-2025",
        Provider::VertexGemini,
    ),
    entry("gemini-2.5-flash-audio", "gemini-2.5-flash", Provider::VertexGemini),
];

const TABLE: &[(CapabilityClass, &[ModelEntry])] = &[
    (CapabilityClass::Text, TEXT_MODELS),
    (CapabilityClass::Image, IMAGE_MODELS),
    (CapabilityClass::Vision, VISION_MODELS),
    (CapabilityClass::Audio, AUDIO_MODELS),
];

/// Lower-case, trim, and drop an optional `models/` path prefix.
pub fn normalize(model_id: &str) -> String {
    let lowered = model_id.trim().to_ascii_lowercase();
    lowered
        .strip_prefix("models/")
        .map(str::to_string)
        .unwrap_or(lowered)
}

fn endpoint_template(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => templates::GEMINI_GENERATE_CONTENT,
        Provider::VertexGemini => templates::VERTEX_GENERATE_CONTENT,
        Provider::Imagen => templates::VERTEX_PREDICT,
        Provider::LegacyGemini => templates::GEMINI_GENERATE_IMAGE,
    }
}

fn describe(model_id: String, capability: CapabilityClass, entry: &ModelEntry) -> ModelDescriptor {
    ModelDescriptor {
        model_id,
        capability,
        provider: entry.provider,
        vendor_model: entry.vendor_model.to_string(),
        endpoint_template: endpoint_template(entry.provider).to_string(),
    }
}

fn lookup(id: &str) -> Option<(CapabilityClass, &'static ModelEntry)> {
    TABLE.iter().find_map(|(capability, entries)| {
        entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| (*capability, entry))
    })
}

/// Descriptor for the baseline text model.
pub fn default_descriptor() -> ModelDescriptor {
    let (capability, entry) =
        lookup(DEFAULT_TEXT_MODEL).unwrap_or((CapabilityClass::Text, &TEXT_MODELS[0]));
    describe(DEFAULT_TEXT_MODEL.to_string(), capability, entry)
}

/// Resolve a model id. Unknown ids log a warning and get the default text
/// descriptor; this never fails.
pub fn resolve(model_id: &str) -> ModelDescriptor {
    let id = normalize(model_id);
    match lookup(&id) {
        Some((capability, entry)) => describe(id, capability, entry),
        None => {
            tracing::warn!(
                "Unknown model id '{}', falling back to {}",
                model_id,
                DEFAULT_TEXT_MODEL
            );
            default_descriptor()
        }
    }
}

/// Every model id the table knows about, in table order.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    TABLE
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|entry| entry.id))
}
