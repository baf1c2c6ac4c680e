use crate::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// How a vendor call authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorAuth {
    /// Generative Language API key, sent as `x-goog-api-key`.
    ApiKey(String),
    /// OAuth access token, sent as `Authorization: Bearer`.
    Bearer(String),
}

/// Thin JSON-over-HTTPS client shared by every provider.
pub struct VendorHttpClient {
    client: Client,
    timeout: Duration,
}

impl VendorHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self::new_with_client(Client::new(), timeout)
    }

    pub fn new_with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            tracing::error!("Vendor request to {} timed out after {:?}", url, self.timeout);
            Error::UpstreamTimeout(format!("{} did not answer within {:?}", url, self.timeout))
        } else {
            tracing::error!("Failed to send request to {}: {}", url, e);
            Error::Http(e)
        }
    }

    /// POST a JSON body and parse the JSON reply.
    ///
    /// Non-2xx replies become [`Error::Upstream`] carrying the vendor status
    /// and raw body.
    pub async fn post_json(&self, url: &str, auth: &VendorAuth, body: &Value) -> Result<Value> {
        tracing::debug!("POST {} ({} byte body)", url, body.to_string().len());

        let request = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json");
        let request = match auth {
            VendorAuth::ApiKey(key) => request.header("x-goog-api-key", key),
            VendorAuth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        if !status.is_success() {
            tracing::error!("Vendor API error (status {}): {}", status, text);
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!("Vendor replied {} ({} bytes)", status, text.len());
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse vendor response: {}\nBody: {}", e, text);
            Error::Upstream {
                status: status.as_u16(),
                body: format!("unparseable response body ({}): {}", e, text),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_api_key_header_and_json_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/m:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = VendorHttpClient::new(Duration::from_secs(5));
        let url = format!("{}/v1beta/models/m:generateContent", server.uri());
        let reply = client
            .post_json(&url, &VendorAuth::ApiKey("secret".to_string()), &serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(reply, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_bearer_auth_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("authorization", "Bearer ya29.abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = VendorHttpClient::new(Duration::from_secs(5));
        client
            .post_json(
                &format!("{}/predict", server.uri()),
                &VendorAuth::Bearer("ya29.abc".to_string()),
                &serde_json::json!({}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_keeps_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = VendorHttpClient::new(Duration::from_secs(5));
        let err = client
            .post_json(
                &server.uri(),
                &VendorAuth::ApiKey("k".to_string()),
                &serde_json::json!({}),
            )
            .await
            .unwrap_err();

        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_vendor_is_upstream_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = VendorHttpClient::new(Duration::from_millis(50));
        let err = client
            .post_json(
                &server.uri(),
                &VendorAuth::ApiKey("k".to_string()),
                &serde_json::json!({}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }

    #[tokio::test]
    async fn test_non_json_success_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = VendorHttpClient::new(Duration::from_secs(5));
        let err = client
            .post_json(
                &server.uri(),
                &VendorAuth::ApiKey("k".to_string()),
                &serde_json::json!({}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upstream { status: 200, .. }));
    }
}
