use super::ImageHost;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockImageHost {
    uploads: Arc<Mutex<HashMap<String, String>>>,
    base_url: String,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-images.example.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_upload(&self, name: &str) -> Option<String> {
        self.uploads.lock().unwrap().get(name).cloned()
    }
}

impl Default for MockImageHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, image_base64: &str, name: &str) -> Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .insert(name.to_string(), image_base64.to_string());
        Ok(format!("{}/{}", self.base_url, name))
    }
}
