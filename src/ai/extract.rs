//! Response extraction.
//!
//! Vendors disagree on where an image lands in the response (camelCase vs
//! snake_case keys, `media`, `image.base64`, Imagen's `predictions`). Each
//! provider gets an ordered list of [`Accessor`]s tried first to last; Gemini
//! shaped responses additionally fall back to a depth-first scan for a long
//! base64 string. Text is fail-soft: a missing text part yields `None`.

use crate::models::{GenerationResult, OutputModality, Provider};
use crate::{Error, Result};
use serde_json::Value;

/// Strings at or below this length are never taken by the fallback scan.
pub const MIN_SCAN_LENGTH: usize = 500;
pub const FALLBACK_SCAN_LABEL: &str = "recursive scan (base64 string longer than 500)";
const EXCERPT_LIMIT: usize = 1000;

/// A known payload location, addressed by JSON pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessor {
    pub label: &'static str,
    pointer: &'static str,
}

impl Accessor {
    pub const fn new(label: &'static str, pointer: &'static str) -> Self {
        Self { label, pointer }
    }

    /// The non-empty string at this location, if there is one.
    pub fn get<'a>(&self, response: &'a Value) -> Option<&'a str> {
        response
            .pointer(self.pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

pub const GEMINI_IMAGE_PATHS: &[Accessor] = &[
    Accessor::new(
        "candidates[0].content.parts[0].inlineData.data",
        "/candidates/0/content/parts/0/inlineData/data",
    ),
    Accessor::new(
        "candidates[0].content.parts[0].inline_data.data",
        "/candidates/0/content/parts/0/inline_data/data",
    ),
    Accessor::new(
        "candidates[0].content.parts[0].media.data",
        "/candidates/0/content/parts/0/media/data",
    ),
    Accessor::new(
        "candidates[0].content.parts[0].image.base64",
        "/candidates/0/content/parts/0/image/base64",
    ),
];

pub const IMAGEN_IMAGE_PATHS: &[Accessor] = &[
    Accessor::new("predictions[0].imageBase64", "/predictions/0/imageBase64"),
    Accessor::new(
        "predictions[0].bytesBase64Encoded",
        "/predictions/0/bytesBase64Encoded",
    ),
];

struct ImageStrategy {
    accessors: &'static [Accessor],
    scan: bool,
}

fn image_strategy(provider: Provider) -> ImageStrategy {
    match provider {
        Provider::Gemini | Provider::VertexGemini | Provider::LegacyGemini => ImageStrategy {
            accessors: GEMINI_IMAGE_PATHS,
            scan: true,
        },
        Provider::Imagen => ImageStrategy {
            accessors: IMAGEN_IMAGE_PATHS,
            scan: false,
        },
    }
}

/// First accessor in `accessors` that finds a value, with its label.
pub fn first_match<'a>(
    response: &'a Value,
    accessors: &[Accessor],
) -> Option<(&'static str, &'a str)> {
    accessors
        .iter()
        .find_map(|accessor| accessor.get(response).map(|found| (accessor.label, found)))
}

fn looks_like_base64(s: &str) -> bool {
    s.len() > MIN_SCAN_LENGTH
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

/// Depth-first search in key order for the first long base64-alphabet string.
pub fn scan_for_base64(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if looks_like_base64(s) => Some(s),
        Value::Object(map) => map.values().find_map(scan_for_base64),
        Value::Array(items) => items.iter().find_map(scan_for_base64),
        _ => None,
    }
}

/// Text of the first part of the first candidate that has any.
pub fn extract_text(response: &Value) -> Option<String> {
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|part| {
            part.get("text")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })
        .map(str::to_string)
}

/// Locate the base64 image payload, or explain every place that was tried.
pub fn extract_image(provider: Provider, response: &Value) -> Result<String> {
    let strategy = image_strategy(provider);

    if let Some((label, found)) = first_match(response, strategy.accessors) {
        tracing::debug!("Image payload found at {} ({} chars)", label, found.len());
        return Ok(found.to_string());
    }

    if strategy.scan {
        if let Some(found) = scan_for_base64(response) {
            tracing::warn!(
                "Image payload only found by fallback scan ({} chars); response shape may have changed",
                found.len()
            );
            return Ok(found.to_string());
        }
    }

    let mut attempted: Vec<String> = strategy
        .accessors
        .iter()
        .map(|accessor| accessor.label.to_string())
        .collect();
    if strategy.scan {
        attempted.push(FALLBACK_SCAN_LABEL.to_string());
    }

    let excerpt = summarize(response);
    tracing::error!(
        "No image payload in {:?} response (tried {}): {}",
        provider,
        attempted.join(", "),
        excerpt
    );
    Err(Error::MissingPayload {
        payload: "image".to_string(),
        attempted,
        excerpt,
    })
}

/// Canonical result for the expected modality.
///
/// Only a missing image is an error. Missing text comes back as `None`, and
/// `TEXT_AND_IMAGE` always looks for both.
pub fn extract(
    provider: Provider,
    response: &Value,
    modality: OutputModality,
) -> Result<GenerationResult> {
    let text = if modality.wants_text() {
        let text = extract_text(response);
        if text.is_none() {
            tracing::debug!("No text part in {:?} response", provider);
        }
        text
    } else {
        None
    };

    let image_base64 = if modality.wants_image() {
        Some(extract_image(provider, response)?)
    } else {
        None
    };

    Ok(GenerationResult { text, image_base64 })
}

fn collapse_payloads(value: &Value) -> Value {
    match value {
        Value::String(s) if s.len() > MIN_SCAN_LENGTH => {
            Value::String(format!("<{} chars>", s.len()))
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), collapse_payloads(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(collapse_payloads).collect()),
        other => other.clone(),
    }
}

/// Compact, bounded rendering of a response for error messages and logs.
pub fn summarize(response: &Value) -> String {
    let rendered = collapse_payloads(response).to_string();
    if rendered.len() <= EXCERPT_LIMIT {
        return rendered;
    }
    let mut cut = EXCERPT_LIMIT;
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes total)", &rendered[..cut], rendered.len())
}
