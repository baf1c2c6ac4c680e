//! Gateway between a chat UI and Google's generative endpoints
//!
//! Resolves a model id to a provider (Gemini, Vertex AI Gemini, Imagen),
//! builds the vendor-specific request body, calls the vendor, and extracts a
//! canonical text/image result from whatever response shape comes back.

pub mod ai;
pub mod auth;
pub mod error;
pub mod hosting;
pub mod mime;
pub mod models;
pub mod router;
pub mod store;
pub mod templates;

pub use error::{Error, Result};
