//! Vendor request bodies.
//!
//! [`GenerationRequest::compose`] applies precedence (request settings, then
//! persisted model config, then hard defaults) one field at a time, and
//! [`build_request_body`] turns the result into the exact JSON each provider
//! expects. Undefined optional fields are omitted rather than sent as null.

use crate::models::{
    CapabilityClass, GenerationRequest, ModelConfig, ModelDescriptor, ModelSettings,
    OutputModality, Provider,
};
use crate::Result;
use serde::Serialize;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";
pub const DEFAULT_SAMPLE_COUNT: u32 = 1;

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

impl GenerationRequest {
    pub fn compose(
        text: &str,
        settings: &ModelSettings,
        config: Option<&ModelConfig>,
        descriptor: &ModelDescriptor,
    ) -> Self {
        let system_instruction = non_blank(settings.system_instruction.as_ref())
            .or_else(|| non_blank(config.and_then(|c| c.system_prompt.as_ref())));

        let requested = settings
            .output_modality
            .or_else(|| config.and_then(|c| c.output_type))
            .unwrap_or(match descriptor.capability {
                CapabilityClass::Image => OutputModality::Image,
                _ => OutputModality::Text,
            });

        Self {
            text: text.to_string(),
            system_instruction,
            temperature: settings
                .temperature
                .or_else(|| config.and_then(|c| c.temperature))
                .or(Some(DEFAULT_TEMPERATURE)),
            top_p: settings.top_p.or_else(|| config.and_then(|c| c.top_p)),
            max_output_tokens: settings
                .max_output_tokens
                .or_else(|| config.and_then(|c| c.max_output_tokens))
                .or(Some(DEFAULT_MAX_OUTPUT_TOKENS)),
            output_modality: effective_modality(descriptor, requested),
            aspect_ratio: non_blank(settings.aspect_ratio.as_ref())
                .or_else(|| non_blank(config.and_then(|c| c.aspect_ratio.as_ref())))
                .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string()),
            sample_count: settings
                .sample_count
                .or_else(|| config.and_then(|c| c.sample_count))
                .unwrap_or(DEFAULT_SAMPLE_COUNT),
        }
    }
}

/// Clamp a requested modality to what the model can return.
pub fn effective_modality(descriptor: &ModelDescriptor, requested: OutputModality) -> OutputModality {
    match descriptor.provider {
        Provider::Imagen | Provider::LegacyGemini => OutputModality::Image,
        Provider::Gemini | Provider::VertexGemini => {
            if descriptor.capability == CapabilityClass::Image {
                requested
            } else {
                OutputModality::Text
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Serialize)]
struct PredictBody {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyImageBody {
    prompt: String,
    sample_count: u32,
}

fn generate_content_body(
    descriptor: &ModelDescriptor,
    request: &GenerationRequest,
) -> GenerateContentBody {
    let response_modalities = (descriptor.capability == CapabilityClass::Image)
        .then(|| request.output_modality.response_modalities());

    GenerateContentBody {
        contents: vec![Content {
            role: "user",
            parts: vec![TextPart {
                text: request.text.clone(),
            }],
        }],
        system_instruction: request.system_instruction.as_ref().map(|text| Content {
            role: "system",
            parts: vec![TextPart { text: text.clone() }],
        }),
        generation_config: GenerationConfig {
            temperature: request.temperature,
            top_p: request.top_p,
            max_output_tokens: request.max_output_tokens,
            response_modalities,
        },
    }
}

/// Build the provider-specific JSON body for a composed request.
pub fn build_request_body(
    descriptor: &ModelDescriptor,
    request: &GenerationRequest,
) -> Result<serde_json::Value> {
    let body = match descriptor.provider {
        Provider::Gemini | Provider::VertexGemini => {
            serde_json::to_value(generate_content_body(descriptor, request))?
        }
        Provider::Imagen => serde_json::to_value(PredictBody {
            instances: vec![PredictInstance {
                prompt: request.text.clone(),
            }],
            parameters: PredictParameters {
                sample_count: request.sample_count,
                aspect_ratio: request.aspect_ratio.clone(),
            },
        })?,
        Provider::LegacyGemini => serde_json::to_value(LegacyImageBody {
            prompt: request.text.clone(),
            sample_count: request.sample_count,
        })?,
    };
    Ok(body)
}
