use super::ImageHost;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};

const DEFAULT_BASE_URL: &str = "https://api.imgbb.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

pub struct ImgBbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ImgBbClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, Client::new())
    }

    pub fn new_with_client(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn upload_once(&self, image_base64: &str, name: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/1/upload", self.base_url))
            .timeout(Duration::from_secs(60))
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", image_base64), ("name", name)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("ImgBB upload request failed: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(Error::ImageHost(format!(
                "ImgBB upload failed (status {}): {}",
                status, body
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::ImageHost(format!("Unexpected ImgBB response: {}", e)))?;
        Ok(parsed.data.url)
    }
}

#[async_trait]
impl ImageHost for ImgBbClient {
    async fn upload(&self, image_base64: &str, name: &str) -> Result<String> {
        // Only transport failures are retried; ImgBB rejections are final.
        let retry_strategy = FixedInterval::from_millis(1000).take(2);

        let url = RetryIf::spawn(
            retry_strategy,
            || self.upload_once(image_base64, name),
            |e: &Error| matches!(e, Error::Http(_)),
        )
        .await?;

        tracing::info!("Uploaded {} to {}", name, url);
        Ok(url)
    }
}
