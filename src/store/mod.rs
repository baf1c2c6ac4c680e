//! Persisted per-model configuration
//!
//! The gateway reads `enabled` flags and generation defaults through this
//! trait. A missing entry means "use the documented defaults".

pub mod file;
pub mod memory;

pub use file::JsonFileConfigStore;
pub use memory::InMemoryConfigStore;

use crate::models::ModelConfig;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ModelConfigStore: Send + Sync {
    async fn load_config(&self, model_id: &str) -> Result<Option<ModelConfig>>;
}
