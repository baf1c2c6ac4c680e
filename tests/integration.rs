use chrono::Utc;
use genai_gateway::{
    ai::{EndpointContext, Gateway, GatewayServices, VendorHttpClient},
    auth::{ManualClock, MockCredentialProvider, TokenCache},
    hosting::{ImageHost, MockImageHost},
    models::{GenerateInput, ModelConfig, ModelSettings, OutputModality, Provider},
    router,
    store::InMemoryConfigStore,
    Error,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGEN_4_PATH: &str =
    "/v1/projects/demo/locations/us-central1/publishers/google/models/imagen-4.0-generate-001:predict";

/// A base64 payload long enough to be picked up by the fallback scan.
fn long_png_base64() -> String {
    format!("iVBORw0KGgo{}", "A".repeat(600))
}

struct Harness {
    server: MockServer,
    credentials: MockCredentialProvider,
}

impl Harness {
    async fn start() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        Self {
            server: MockServer::start().await,
            credentials: MockCredentialProvider::new(clock),
        }
    }

    fn gateway(&self, store: InMemoryConfigStore) -> Gateway {
        Gateway::with_services(GatewayServices {
            http: VendorHttpClient::new(Duration::from_secs(5)),
            store: Box::new(store),
            tokens: Some(Arc::new(TokenCache::new(Box::new(self.credentials.clone())))),
            gemini_api_key: Some("api-key".to_string()),
            endpoints: EndpointContext {
                gemini_base: self.server.uri(),
                vertex_base: self.server.uri(),
                project: Some("demo".to_string()),
                location: "us-central1".to_string(),
            },
            fallback_model: "gemini-2.5-flash".to_string(),
        })
    }
}

#[tokio::test]
async fn test_imagen_scenario_end_to_end() {
    let harness = Harness::start().await;

    let descriptor = router::resolve("imagen-4");
    assert_eq!(descriptor.provider, Provider::Imagen);
    assert!(descriptor.endpoint_template.contains(":predict"));

    Mock::given(method("POST"))
        .and(path(IMAGEN_4_PATH))
        .and(header("authorization", "Bearer token-1"))
        .and(body_json(serde_json::json!({
            "instances": [{ "prompt": "a red bicycle" }],
            "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{ "bytesBase64Encoded": "AAAA", "mimeType": "image/png" }]
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let input = GenerateInput::new("imagen-4", "a red bicycle").with_settings(ModelSettings {
        output_modality: Some(OutputModality::Image),
        ..Default::default()
    });

    let result = harness.gateway(InMemoryConfigStore::new()).generate(&input).await.unwrap();
    assert_eq!(result.image_base64.as_deref(), Some("AAAA"));
    assert_eq!(result.text, None);
}

#[tokio::test]
async fn test_disabled_model_never_reaches_vendor_or_token_endpoint() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let store = InMemoryConfigStore::new().with_config(
        "gemini-2.5-flash",
        ModelConfig {
            enabled: false,
            ..Default::default()
        },
    );
    let input = GenerateInput::new("gemini-2.5-flash", "hello").with_settings(ModelSettings {
        output_modality: Some(OutputModality::Text),
        ..Default::default()
    });

    let err = harness.gateway(store).generate(&input).await.unwrap_err();
    assert!(matches!(err, Error::ModelDisabled { .. }));
    assert_eq!(harness.credentials.get_call_count(), 0);
}

#[tokio::test]
async fn test_persisted_config_and_request_overrides_reach_the_wire() {
    let harness = Harness::start().await;
    let png = long_png_base64();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image:generateContent"))
        .and(header("x-goog-api-key", "api-key"))
        .and(body_json(serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": "a cat with a caption" }] }],
            "systemInstruction": { "role": "system", "parts": [{ "text": "Draw in watercolor." }] },
            "generationConfig": {
                "temperature": 0.2,
                "topP": 0.8,
                "maxOutputTokens": 8192,
                "responseModalities": ["TEXT", "IMAGE"]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [
                { "text": "A watercolor cat." },
                { "inlineData": { "mimeType": "image/png", "data": png.clone() } }
            ] } }]
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let store = InMemoryConfigStore::new().with_config(
        "nanobanana",
        ModelConfig {
            system_prompt: Some("Draw in watercolor.".to_string()),
            temperature: Some(0.9),
            top_p: Some(0.8),
            output_type: Some(OutputModality::TextAndImage),
            ..Default::default()
        },
    );
    let input = GenerateInput::new("nanobanana", "a cat with a caption").with_settings(ModelSettings {
        temperature: Some(0.2),
        ..Default::default()
    });

    let result = harness.gateway(store.clone()).generate_image(&input).await.unwrap();

    // Text comes first, so the image is only reachable through the scan.
    assert_eq!(result.text.as_deref(), Some("A watercolor cat."));
    assert_eq!(result.image_base64, Some(png));
    assert_eq!(store.get_read_count(), 1);
}

#[tokio::test]
async fn test_missing_image_surfaces_missing_payload() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I can't draw that." }] },
                "finishReason": "SAFETY"
            }]
        })))
        .mount(&harness.server)
        .await;

    let err = harness
        .gateway(InMemoryConfigStore::new())
        .generate(&GenerateInput::new("nanobanana", "something blocked"))
        .await
        .unwrap_err();

    match err {
        Error::MissingPayload { attempted, excerpt, .. } => {
            assert!(attempted
                .iter()
                .any(|p| p == "candidates[0].content.parts[0].inline_data.data"));
            assert!(excerpt.contains("SAFETY"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_text_model_without_text_returns_none() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        })))
        .mount(&harness.server)
        .await;

    let result = harness
        .gateway(InMemoryConfigStore::new())
        .generate(&GenerateInput::new("gemini-2.5-pro", "hello"))
        .await
        .unwrap();
    assert_eq!(result.text, None);
    assert_eq!(result.image_base64, None);
}

#[tokio::test]
async fn test_unknown_model_is_served_by_default_text_model() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/demo/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "default model here" }] } }]
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let result = harness
        .gateway(InMemoryConfigStore::new())
        .generate(&GenerateInput::new("some-future-model", "hello"))
        .await
        .unwrap();
    assert_eq!(result.text.as_deref(), Some("default model here"));
}

#[tokio::test]
async fn test_token_reused_across_requests() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(3)
        .mount(&harness.server)
        .await;

    let gateway = harness.gateway(InMemoryConfigStore::new());
    for _ in 0..3 {
        gateway
            .generate_text(&GenerateInput::new("gemini-2.0-flash", "ping"))
            .await
            .unwrap();
    }
    assert_eq!(harness.credentials.get_call_count(), 1);
}

#[tokio::test]
async fn test_generated_image_can_be_hosted() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGEN_4_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{ "imageBase64": "QUJD" }]
        })))
        .mount(&harness.server)
        .await;

    let result = harness
        .gateway(InMemoryConfigStore::new())
        .generate_image(&GenerateInput::new("imagen-4", "a lighthouse"))
        .await
        .unwrap();

    let host = MockImageHost::new().with_base_url("https://img.test".to_string());
    let image = result.image_base64.unwrap();
    let url = host.upload(&image, "lighthouse").await.unwrap();

    assert_eq!(url, "https://img.test/lighthouse");
    assert_eq!(host.get_upload("lighthouse").as_deref(), Some("QUJD"));
}
