//! Service account access tokens via the OAuth 2.0 JWT bearer grant.

use super::{AccessToken, CredentialProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The subset of a service account key file the grant needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ServiceAccountCredentials {
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: Self = serde_json::from_str(json).map_err(|e| {
            Error::Configuration(format!("Invalid service account JSON: {}", e))
        })?;
        if creds.client_email.trim().is_empty() || creds.private_key.trim().is_empty() {
            return Err(Error::Configuration(
                "Service account JSON is missing client_email or private_key".to_string(),
            ));
        }
        Ok(creds)
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    fn scope(&self) -> String {
        if self.scopes.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            self.scopes.join(" ")
        }
    }
}

#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct ServiceAccountTokenProvider {
    creds: ServiceAccountCredentials,
    http: reqwest::Client,
    assertion_override: Option<String>,
}

impl ServiceAccountTokenProvider {
    pub fn new(creds: ServiceAccountCredentials, http: reqwest::Client) -> Self {
        Self {
            creds,
            http,
            assertion_override: None,
        }
    }

    /// Skip RS256 signing and send a prebuilt assertion instead.
    pub fn with_assertion_override(mut self, assertion: String) -> Self {
        self.assertion_override = Some(assertion);
        self
    }

    fn assertion(&self) -> Result<String> {
        if let Some(assertion) = &self.assertion_override {
            return Ok(assertion.clone());
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.creds.client_email.clone(),
            scope: self.creds.scope(),
            aud: self.creds.token_uri().to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        let key = EncodingKey::from_rsa_pem(self.creds.private_key.as_bytes()).map_err(|e| {
            Error::Configuration(format!("Invalid service account private key: {}", e))
        })?;
        encode(&header, &claims, &key)
            .map_err(|e| Error::Configuration(format!("Failed to sign JWT assertion: {}", e)))
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let assertion = self.assertion()?;
        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        tracing::debug!(
            "Requesting access token for {} from {}",
            self.creds.client_email,
            self.creds.token_uri()
        );

        let response = self
            .http
            .post(self.creds.token_uri())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach token endpoint: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            tracing::error!("Token endpoint error (status {}): {}", status, body);
            // A 4xx here means the credential itself was rejected.
            if status.is_client_error() {
                return Err(Error::Configuration(format!(
                    "Service account {} was rejected by the token endpoint (status {}): {}",
                    self.creds.client_email, status, body
                )));
            }
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds_for(server: &MockServer) -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            client_email: "bot@demo.iam.gserviceaccount.com".to_string(),
            private_key: "unused".to_string(),
            token_uri: Some(format!("{}/token", server.uri())),
            project_id: Some("demo".to_string()),
            scopes: vec![],
        }
    }

    #[test]
    fn test_from_json_requires_email_and_key() {
        let err = ServiceAccountCredentials::from_json(r#"{"client_email":"","private_key":"k"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let creds = ServiceAccountCredentials::from_json(
            r#"{"type":"service_account","client_email":"a@b.c","private_key":"k","project_id":"p"}"#,
        )
        .unwrap();
        assert_eq!(creds.project_id.as_deref(), Some("p"));
        assert_eq!(creds.token_uri(), DEFAULT_TOKEN_URI);
        assert_eq!(creds.scope(), DEFAULT_SCOPE);
    }

    #[test]
    fn test_invalid_private_key_is_configuration_error() {
        let creds = ServiceAccountCredentials::from_json(
            r#"{"client_email":"a@b.c","private_key":"not a pem"}"#,
        )
        .unwrap();
        let provider = ServiceAccountTokenProvider::new(creds, reqwest::Client::new());
        let err = provider.assertion().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_exchanges_assertion_for_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("assertion=signed-jwt"))
            .and(body_string_contains("jwt-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.test",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ServiceAccountTokenProvider::new(creds_for(&server), reqwest::Client::new())
            .with_assertion_override("signed-jwt".to_string());

        let token = provider.access_token().await.unwrap();
        assert_eq!(token.token, "ya29.test");
        assert!(token.expires_at > Utc::now() + Duration::seconds(3500));
    }

    #[tokio::test]
    async fn test_rejected_grant_is_configuration_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let provider = ServiceAccountTokenProvider::new(creds_for(&server), reqwest::Client::new())
            .with_assertion_override("signed-jwt".to_string());

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("invalid_grant")));
        assert!(!err.is_model_unavailable());
    }

    #[tokio::test]
    async fn test_token_endpoint_outage_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let provider = ServiceAccountTokenProvider::new(creds_for(&server), reqwest::Client::new())
            .with_assertion_override("signed-jwt".to_string());

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));
    }
}
