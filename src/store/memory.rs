use super::ModelConfigStore;
use crate::models::ModelConfig;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    configs: Arc<Mutex<HashMap<String, ModelConfig>>>,
    read_count: Arc<Mutex<usize>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(self, model_id: &str, config: ModelConfig) -> Self {
        self.configs
            .lock()
            .unwrap()
            .insert(model_id.to_string(), config);
        self
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }
}

#[async_trait]
impl ModelConfigStore for InMemoryConfigStore {
    async fn load_config(&self, model_id: &str) -> Result<Option<ModelConfig>> {
        *self.read_count.lock().unwrap() += 1;
        Ok(self.configs.lock().unwrap().get(model_id).cloned())
    }
}
