//! Durable image URLs
//!
//! Generated images come back as base64; an [`ImageHost`] turns one into a
//! public URL the chat UI can store and render.

pub mod imgbb;
pub mod mock;

pub use imgbb::ImgBbClient;
pub use mock::MockImageHost;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload a base64 image and return its public URL.
    async fn upload(&self, image_base64: &str, name: &str) -> Result<String>;
}
