use super::ModelConfigStore;
use crate::models::ModelConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads a JSON object of `{ "<model id>": { ...config } }` from disk.
///
/// The file is re-read on every lookup so edits apply without a restart. A
/// missing file behaves like an empty object.
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, ModelConfig>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No model config file at {}", self.path.display());
                return Ok(HashMap::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        serde_json::from_str(&raw).map_err(|e| {
            Error::Configuration(format!(
                "Invalid model config file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ModelConfigStore for JsonFileConfigStore {
    async fn load_config(&self, model_id: &str) -> Result<Option<ModelConfig>> {
        let mut all = self.read_all().await?;
        Ok(all.remove(model_id))
    }
}
