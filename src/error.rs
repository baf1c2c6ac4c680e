//! Error handling and custom error types
//!
//! Every failure the gateway can surface lives here, from credential problems
//! through vendor schema drift, using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model '{model_id}' is disabled")]
    ModelDisabled { model_id: String },

    #[error("Model '{model_id}' is a {capability} model; use the {endpoint} endpoint instead")]
    UnsupportedModel {
        model_id: String,
        capability: String,
        endpoint: String,
    },

    #[error("Upstream error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("No {payload} found in vendor response (tried: {}); response: {excerpt}", .attempted.join(", "))]
    MissingPayload {
        payload: String,
        attempted: Vec<String>,
        excerpt: String,
    },

    #[error("Image host error: {0}")]
    ImageHost(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    /// True only for vendor rejections that mean "this model can't serve the
    /// request" (400/404). The chat fallback keys off this and nothing else.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Error::Upstream { status: 400 | 404, .. })
    }

    /// HTTP-equivalent status for whatever layer turns errors into responses.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::ModelDisabled { .. } => 403,
            Error::UnsupportedModel { .. } => 400,
            Error::Upstream { .. } | Error::MissingPayload { .. } => 502,
            Error::UpstreamTimeout(_) => 504,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
