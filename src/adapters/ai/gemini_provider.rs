//! Gemini Provider - Implementation of AIProvider for Google's Gemini API.
//!
//! Calls the `generateContent` endpoint once per request. Structured output is
//! requested through `responseMimeType` and `responseSchema` in the
//! generation config.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(Some(api_key))
//!     .with_model("gemini-2.5-flash")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! A missing API key does not prevent construction. Calls fail with
//! `AIError::NotConfigured` instead, without touching the network.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Default model for guidance requests.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Seconds to wait after a 429 when the provider gives no hint.
const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication. `None` when not configured.
    api_key: Option<Secret<String>>,
    /// Model to use (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a configuration. Blank keys are treated as absent.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if an API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the generateContent endpoint URL.
    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Converts our request to Gemini's format.
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let format = &request.response_format;
        let structured = format.schema().is_some();

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: structured.then(|| format.mime_type().to_string()),
                response_schema: format.schema().cloned(),
            },
        }
    }

    /// Sends a request.
    async fn send_request(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Response, AIError> {
        let body = Self::to_gemini_request(request);

        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(map_error_status(status, &error_body))
    }

    /// Parses a successful response.
    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = Self::handle_response_status(response).await?;

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        extract_completion(gemini_response, &self.config.model)
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| AIError::not_configured("Gemini API key is not set"))?;

        tracing::debug!(
            trace_id = %request.metadata.trace_id,
            model = %self.config.model,
            "Sending generateContent request"
        );

        let response = self.send_request(api_key, &request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.model, self.config.has_api_key())
    }
}

/// Maps a non-success status and its body to an error.
fn map_error_status(status: StatusCode, error_body: &str) -> AIError {
    let message = parse_error_message(error_body).unwrap_or_else(|| error_body.to_string());

    match status.as_u16() {
        400 if is_invalid_key_error(error_body) => AIError::authentication(message),
        401 | 403 => AIError::authentication(message),
        429 => AIError::rate_limited(parse_retry_after(error_body)),
        400 | 404 => AIError::InvalidRequest(message),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, message)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, message)),
    }
}

/// Gemini reports a bad key as a 400 with `API_KEY_INVALID`.
fn is_invalid_key_error(error_body: &str) -> bool {
    error_body.contains("API_KEY_INVALID") || error_body.contains("API key not valid")
}

/// Extracts `error.message` from a Google API error body.
fn parse_error_message(error_body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(error_body).ok()?;
    parsed
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Parses the `RetryInfo.retryDelay` hint (e.g. `"37s"`) from a 429 body.
fn parse_retry_after(error_body: &str) -> u32 {
    let Ok(parsed) = serde_json::from_str::<Value>(error_body) else {
        return DEFAULT_RETRY_AFTER_SECS;
    };

    parsed
        .get("error")
        .and_then(|e| e.get("details"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|detail| detail.get("retryDelay").and_then(Value::as_str))
        .filter_map(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
        .map(|secs| secs.ceil() as u32)
        .next()
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Turns a decoded Gemini response into a completion.
///
/// A missing candidate is not an error here: the content is empty and the
/// caller decides what an empty answer means.
fn extract_completion(
    response: GeminiResponse,
    configured_model: &str,
) -> Result<CompletionResponse, AIError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(AIError::content_filtered(format!("prompt blocked: {}", reason)));
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();
    let model = response
        .model_version
        .unwrap_or_else(|| configured_model.to_string());

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(CompletionResponse {
            content: String::new(),
            usage,
            model,
            finish_reason: FinishReason::Other,
        });
    };

    let finish_reason = map_finish_reason(candidate.finish_reason.as_deref());
    let content: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if content.is_empty() && finish_reason == FinishReason::ContentFilter {
        return Err(AIError::content_filtered(format!(
            "candidate stopped: {}",
            candidate.finish_reason.unwrap_or_default()
        )));
    }

    Ok(CompletionResponse {
        content,
        usage,
        model,
        finish_reason,
    })
}

fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Other,
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> GeminiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new(Some("test-key".to_string()))
            .with_model("gemini-2.0-flash")
            .with_base_url("http://localhost:9999/v1beta")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://localhost:9999/v1beta");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_key(), Some("test-key"));
    }

    #[test]
    fn config_defaults() {
        let config = GeminiConfig::new(None);
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(!config.has_api_key());
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        assert!(!GeminiConfig::new(Some("   ".to_string())).has_api_key());
    }

    #[test]
    fn config_debug_does_not_leak_key() {
        let config = GeminiConfig::new(Some("super-secret".to_string()));
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn generate_url_includes_model() {
        let config = GeminiConfig::new(None).with_base_url("https://example.com/v1beta/");
        let provider = GeminiProvider::new(config).unwrap();
        assert_eq!(
            provider.generate_url(),
            "https://example.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn provider_info_reports_configuration() {
        let provider = GeminiProvider::new(GeminiConfig::new(None)).unwrap();
        let info = provider.provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, DEFAULT_GEMINI_MODEL);
        assert!(!info.configured);
    }

    #[test]
    fn structured_request_serializes_generation_config() {
        let request = CompletionRequest::new("pick a verse")
            .with_json_schema(json!({"type": "OBJECT"}))
            .with_temperature(1.2);

        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "pick a verse");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            json!({"type": "OBJECT"})
        );
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 1.2).abs() < 1e-6);
    }

    #[test]
    fn text_request_omits_structured_output() {
        let request = CompletionRequest::new("hello");
        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();
        assert_eq!(body["generationConfig"], json!({}));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let config = GeminiConfig::new(None).with_base_url("http://127.0.0.1:1");
        let provider = GeminiProvider::new(config).unwrap();

        let err = provider
            .complete(CompletionRequest::new("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, AIError::NotConfigured(_)));
    }

    #[test]
    fn invalid_key_maps_to_authentication_failure() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = map_error_status(StatusCode::BAD_REQUEST, body);
        match err {
            AIError::AuthenticationFailed(message) => {
                assert!(message.starts_with("API key not valid"));
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }

    #[test]
    fn forbidden_maps_to_authentication_failure() {
        let err = map_error_status(StatusCode::FORBIDDEN, "{}");
        assert!(err.is_credential_problem());
    }

    #[test]
    fn other_bad_request_is_invalid_request() {
        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload"}}"#;
        let err = map_error_status(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, AIError::InvalidRequest(ref m) if m == "Invalid JSON payload"));
    }

    #[test]
    fn server_errors_are_unavailable() {
        let err = map_error_status(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert!(matches!(err, AIError::Unavailable { .. }));
    }

    #[test]
    fn rate_limit_reads_retry_delay() {
        let body = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED","details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"37s"}]}}"#;
        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 37 }));
    }

    #[test]
    fn rate_limit_defaults_without_hint() {
        assert_eq!(parse_retry_after("not json"), DEFAULT_RETRY_AFTER_SECS);
        assert_eq!(
            parse_retry_after(r#"{"error":{"details":[]}}"#),
            DEFAULT_RETRY_AFTER_SECS
        );
    }

    #[test]
    fn extracts_and_joins_text_parts() {
        let response = decode(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking", "thought": true},
                    {"text": "{\"a\":"},
                    {"text": "1}"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 30, "totalTokenCount": 42},
            "modelVersion": "gemini-2.5-flash-001"
        }));

        let completion = extract_completion(response, "gemini-2.5-flash").unwrap();
        assert_eq!(completion.content, "{\"a\":1}");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage, TokenUsage::new(12, 30));
        assert_eq!(completion.model, "gemini-2.5-flash-001");
    }

    #[test]
    fn oversized_usage_counts_saturate() {
        let response = decode(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4000000000u32, "candidatesTokenCount": 1000000000u32}
        }));

        let completion = extract_completion(response, "gemini-2.5-flash").unwrap();
        assert_eq!(completion.usage.prompt_tokens, 4_000_000_000);
        assert_eq!(completion.usage.completion_tokens, 1_000_000_000);
        assert_eq!(completion.usage.total_tokens, u32::MAX);
    }

    #[test]
    fn missing_candidates_yield_empty_content() {
        let completion = extract_completion(decode(json!({})), "gemini-2.5-flash").unwrap();
        assert!(completion.content.is_empty());
        assert_eq!(completion.model, "gemini-2.5-flash");
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let response = decode(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        let err = extract_completion(response, "m").unwrap_err();
        assert!(matches!(err, AIError::ContentFiltered { .. }));
    }

    #[test]
    fn empty_safety_stop_is_content_filtered() {
        let response = decode(json!({"candidates": [{"finishReason": "SAFETY"}]}));
        let err = extract_completion(response, "m").unwrap_err();
        match err {
            AIError::ContentFiltered { reason } => assert!(reason.contains("SAFETY")),
            other => panic!("expected content filter, got {other:?}"),
        }
    }

    #[test]
    fn finish_reasons_map() {
        assert_eq!(map_finish_reason(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("RECITATION")), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason(None), FinishReason::Other);
    }
}
