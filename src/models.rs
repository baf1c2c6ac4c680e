//! Data models and structures
//!
//! Defines the descriptor produced by the router, the canonical request and
//! result shapes shared by every provider, the persisted per-model
//! configuration, and process configuration.

use crate::auth::ServiceAccountCredentials;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityClass {
    Text,
    Image,
    Vision,
    Audio,
}

impl CapabilityClass {
    /// The gateway path that serves this class of model.
    pub fn endpoint(self) -> Endpoint {
        match self {
            CapabilityClass::Image => Endpoint::Image,
            CapabilityClass::Text | CapabilityClass::Vision | CapabilityClass::Audio => {
                Endpoint::Chat
            }
        }
    }
}

impl fmt::Display for CapabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityClass::Text => "text",
            CapabilityClass::Image => "image",
            CapabilityClass::Vision => "vision",
            CapabilityClass::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Gateway entry points. Each serves a fixed set of capability classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Chat,
    Image,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Chat => f.write_str("chat"),
            Endpoint::Image => f.write_str("image"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Provider {
    /// Generative Language API `generateContent`, API-key auth.
    Gemini,
    /// Vertex AI `generateContent`, bearer-token auth.
    VertexGemini,
    /// Vertex AI Imagen `predict`, bearer-token auth.
    Imagen,
    /// Generative Language API `generateImage` (older image path).
    LegacyGemini,
}

impl Provider {
    pub fn uses_bearer_token(self) -> bool {
        match self {
            Provider::VertexGemini | Provider::Imagen => true,
            Provider::Gemini | Provider::LegacyGemini => false,
        }
    }
}

/// Routing decision for one model id. Derived on every call, never stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub model_id: String,
    #[serde(rename = "capabilityClass")]
    pub capability: CapabilityClass,
    pub provider: Provider,
    pub vendor_model: String,
    pub endpoint_template: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputModality {
    Text,
    Image,
    TextAndImage,
}

impl OutputModality {
    pub fn wants_text(self) -> bool {
        matches!(self, OutputModality::Text | OutputModality::TextAndImage)
    }

    pub fn wants_image(self) -> bool {
        matches!(self, OutputModality::Image | OutputModality::TextAndImage)
    }

    /// Gemini `responseModalities` value for this modality.
    pub fn response_modalities(self) -> Vec<String> {
        let names: &[&str] = match self {
            OutputModality::Text => &["TEXT"],
            OutputModality::Image => &["IMAGE"],
            OutputModality::TextAndImage => &["TEXT", "IMAGE"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

impl FromStr for OutputModality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(OutputModality::Text),
            "IMAGE" => Ok(OutputModality::Image),
            "TEXT_AND_IMAGE" => Ok(OutputModality::TextAndImage),
            other => Err(format!(
                "Invalid modality '{}'. Expected TEXT, IMAGE or TEXT_AND_IMAGE",
                other
            )),
        }
    }
}

/// Per-request overrides. Highest precedence when composing a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modality: Option<OutputModality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u32>,
}

/// Persisted per-model defaults, as stored by the configuration collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub output_type: Option<OutputModality>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub sample_count: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            output_type: None,
            enabled: true,
            aspect_ratio: None,
            sample_count: None,
        }
    }
}

/// Inbound shape handed to the gateway by the HTTP layer or CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    pub model_id: String,
    pub text: String,
    #[serde(flatten)]
    pub settings: ModelSettings,
}

impl GenerateInput {
    pub fn new(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            text: text.into(),
            settings: ModelSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Canonical, provider-agnostic request after precedence has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub output_modality: OutputModality,
    pub aspect_ratio: String,
    pub sample_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub service_account: Option<ServiceAccountCredentials>,
    pub vertex_project: Option<String>,
    pub vertex_location: String,
    pub gemini_base_url: String,
    pub vertex_base_url: String,
    pub generation_timeout: Duration,
    pub model_config_path: Option<PathBuf>,
    pub fallback_model: String,
    pub imgbb_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let service_account = match (
            get("GOOGLE_SERVICE_ACCOUNT_JSON"),
            get("GOOGLE_APPLICATION_CREDENTIALS"),
        ) {
            (Some(json), _) => Some(ServiceAccountCredentials::from_json(&json)?),
            (None, Some(path)) => {
                let json = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Configuration(format!(
                        "Failed to read service account file {}: {}",
                        path, e
                    ))
                })?;
                Some(ServiceAccountCredentials::from_json(&json)?)
            }
            (None, None) => None,
        };

        let vertex_project = get("VERTEX_PROJECT").or_else(|| {
            service_account
                .as_ref()
                .and_then(|sa| sa.project_id.clone())
        });

        let vertex_location =
            get("VERTEX_LOCATION").unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_string());

        let vertex_base_url = get("VERTEX_BASE_URL")
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", vertex_location));

        let timeout_secs = match get("GENERATION_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!(
                    "GENERATION_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            service_account,
            vertex_project,
            vertex_location,
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            vertex_base_url,
            generation_timeout: Duration::from_secs(timeout_secs),
            model_config_path: get("MODEL_CONFIG_PATH").map(PathBuf::from),
            fallback_model: get("FALLBACK_MODEL")
                .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string()),
            imgbb_api_key: get("IMGBB_API_KEY"),
        })
    }
}
