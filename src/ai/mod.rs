//! Vendor integration for text and image generation
//!
//! Builds provider-specific request bodies, calls Gemini, Vertex AI Gemini and
//! Imagen over HTTPS, and normalizes their heterogeneous responses.

pub mod client;
pub mod extract;
pub mod gateway;
pub mod request;

pub use client::{VendorAuth, VendorHttpClient};
pub use extract::extract;
pub use gateway::{EndpointContext, Gateway, GatewayServices};
pub use request::build_request_body;
