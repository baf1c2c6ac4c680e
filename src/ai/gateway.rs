//! Request orchestration for one generation call.

use super::client::{VendorAuth, VendorHttpClient};
use super::extract;
use super::request::build_request_body;
use crate::auth::{ServiceAccountTokenProvider, TokenCache};
use crate::models::{
    Config, Endpoint, GenerateInput, GenerationRequest, GenerationResult, ModelDescriptor,
    Provider,
};
use crate::store::{InMemoryConfigStore, JsonFileConfigStore, ModelConfigStore};
use crate::{router, templates, Error, Result};
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Values substituted into endpoint templates.
#[derive(Debug, Clone)]
pub struct EndpointContext {
    pub gemini_base: String,
    pub vertex_base: String,
    pub project: Option<String>,
    pub location: String,
}

impl EndpointContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gemini_base: config.gemini_base_url.trim_end_matches('/').to_string(),
            vertex_base: config.vertex_base_url.trim_end_matches('/').to_string(),
            project: config.vertex_project.clone(),
            location: config.vertex_location.clone(),
        }
    }

    pub fn url_for(&self, descriptor: &ModelDescriptor) -> Result<String> {
        let project = self.project.as_deref().unwrap_or("");
        if descriptor.provider.uses_bearer_token() && project.is_empty() {
            return Err(Error::Configuration(format!(
                "VERTEX_PROJECT is not set; required for {}",
                descriptor.model_id
            )));
        }

        let url = templates::render(
            &descriptor.endpoint_template,
            &[
                ("gemini_base", self.gemini_base.as_str()),
                ("vertex_base", self.vertex_base.as_str()),
                ("project", project),
                ("location", self.location.as_str()),
                ("model", descriptor.vendor_model.as_str()),
            ],
        );
        if templates::has_placeholders(&url) {
            return Err(Error::Configuration(format!(
                "Endpoint template for {} left unresolved placeholders: {}",
                descriptor.model_id, url
            )));
        }
        Ok(url)
    }
}

/// Injectable service bundle used to construct [`Gateway`] in tests/harnesses.
pub struct GatewayServices {
    pub http: VendorHttpClient,
    pub store: Box<dyn ModelConfigStore>,
    pub tokens: Option<Arc<TokenCache>>,
    pub gemini_api_key: Option<String>,
    pub endpoints: EndpointContext,
    pub fallback_model: String,
}

/// Routes, authenticates, calls and normalizes generation requests.
pub struct Gateway {
    http: VendorHttpClient,
    store: Box<dyn ModelConfigStore>,
    tokens: Option<Arc<TokenCache>>,
    gemini_api_key: Option<String>,
    endpoints: EndpointContext,
    fallback_model: String,
}

impl Gateway {
    pub fn with_services(services: GatewayServices) -> Self {
        Self {
            http: services.http,
            store: services.store,
            tokens: services.tokens,
            gemini_api_key: services.gemini_api_key,
            endpoints: services.endpoints,
            fallback_model: services.fallback_model,
        }
    }

    /// Construct a gateway from process configuration (`Config::from_env`).
    pub fn from_config(config: &Config) -> Result<Self> {
        let fallback = router::resolve(&config.fallback_model);
        if fallback.capability.endpoint() != Endpoint::Chat {
            return Err(Error::Configuration(format!(
                "FALLBACK_MODEL {} is a {} model and cannot serve chat requests",
                fallback.model_id, fallback.capability
            )));
        }

        // One connection pool for vendor calls and token minting.
        let http_client = reqwest::Client::new();

        let store: Box<dyn ModelConfigStore> = match &config.model_config_path {
            Some(path) => {
                info!("Model config: {}", path.display());
                Box::new(JsonFileConfigStore::new(path))
            }
            None => {
                info!("No MODEL_CONFIG_PATH set, every model uses built-in defaults");
                Box::new(InMemoryConfigStore::new())
            }
        };

        let tokens = config.service_account.clone().map(|creds| {
            info!("Vertex credentials: service account {}", creds.client_email);
            Arc::new(TokenCache::new(Box::new(ServiceAccountTokenProvider::new(
                creds,
                http_client.clone(),
            ))))
        });

        if tokens.is_none() && config.gemini_api_key.is_none() {
            warn!("Neither a service account nor GEMINI_API_KEY is configured; vendor calls will fail");
        }

        Ok(Self::with_services(GatewayServices {
            http: VendorHttpClient::new_with_client(http_client, config.generation_timeout),
            store,
            tokens,
            gemini_api_key: config.gemini_api_key.clone(),
            endpoints: EndpointContext::from_config(config),
            fallback_model: config.fallback_model.clone(),
        }))
    }

    /// Route by the model's own capability class.
    pub async fn generate(&self, input: &GenerateInput) -> Result<GenerationResult> {
        match router::resolve(&input.model_id).capability.endpoint() {
            Endpoint::Chat => self.generate_text(input).await,
            Endpoint::Image => self.generate_image(input).await,
        }
    }

    /// Chat path. A 400/404 for the requested model is retried once against
    /// the fallback model; nothing else is retried. If the fallback model is
    /// disabled or not a chat model, the original vendor error is returned.
    pub async fn generate_text(&self, input: &GenerateInput) -> Result<GenerationResult> {
        match self.run(input, Endpoint::Chat).await {
            Err(e) if e.is_model_unavailable() => {
                let requested = router::resolve(&input.model_id);
                let fallback = router::resolve(&self.fallback_model);
                if requested.model_id == fallback.model_id {
                    return Err(e);
                }
                warn!(
                    "Model {} unavailable ({}), retrying once with {}",
                    requested.model_id, e, fallback.model_id
                );
                let mut retry = input.clone();
                retry.model_id = fallback.model_id;
                match self.run(&retry, Endpoint::Chat).await {
                    Err(
                        retry_err @ (Error::ModelDisabled { .. } | Error::UnsupportedModel { .. }),
                    ) => {
                        warn!(
                            "Fallback model {} cannot serve the request ({}), returning the original error",
                            retry.model_id, retry_err
                        );
                        Err(e)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Image path.
    pub async fn generate_image(&self, input: &GenerateInput) -> Result<GenerationResult> {
        self.run(input, Endpoint::Image).await
    }

    async fn run(&self, input: &GenerateInput, endpoint: Endpoint) -> Result<GenerationResult> {
        let span = tracing::info_span!(
            "generate",
            request_id = %Uuid::new_v4(),
            model = %input.model_id,
            endpoint = %endpoint
        );
        self.run_inner(input, endpoint).instrument(span).await
    }

    async fn run_inner(&self, input: &GenerateInput, endpoint: Endpoint) -> Result<GenerationResult> {
        let descriptor = router::resolve(&input.model_id);

        if descriptor.capability.endpoint() != endpoint {
            return Err(Error::UnsupportedModel {
                model_id: descriptor.model_id.clone(),
                capability: descriptor.capability.to_string(),
                endpoint: descriptor.capability.endpoint().to_string(),
            });
        }

        let config = self.store.load_config(&descriptor.model_id).await?;
        if config.as_ref().is_some_and(|c| !c.enabled) {
            info!("Rejecting request: {} is disabled", descriptor.model_id);
            return Err(Error::ModelDisabled {
                model_id: descriptor.model_id.clone(),
            });
        }

        let request =
            GenerationRequest::compose(&input.text, &input.settings, config.as_ref(), &descriptor);
        let body = build_request_body(&descriptor, &request)?;
        let url = self.endpoints.url_for(&descriptor)?;
        let auth = self.auth_for(&descriptor).await?;

        info!(
            "Calling {:?} model {} ({:?})",
            descriptor.provider, descriptor.vendor_model, request.output_modality
        );
        let response = self.http.post_json(&url, &auth, &body).await?;

        let result = extract::extract(descriptor.provider, &response, request.output_modality)?;
        info!(
            "Generation finished: text={} image={}",
            result.text.as_ref().map_or(0, String::len),
            result.image_base64.as_ref().map_or(0, String::len)
        );
        Ok(result)
    }

    async fn auth_for(&self, descriptor: &ModelDescriptor) -> Result<VendorAuth> {
        match descriptor.provider {
            Provider::Gemini | Provider::LegacyGemini => self
                .gemini_api_key
                .clone()
                .map(VendorAuth::ApiKey)
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "GEMINI_API_KEY is not set; required for {}",
                        descriptor.model_id
                    ))
                }),
            Provider::VertexGemini | Provider::Imagen => {
                let tokens = self.tokens.as_ref().ok_or_else(|| {
                    Error::Configuration(format!(
                        "No service account configured; required for {}",
                        descriptor.model_id
                    ))
                })?;
                Ok(VendorAuth::Bearer(tokens.token().await?))
            }
        }
    }
}
