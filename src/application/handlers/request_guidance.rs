//! RequestGuidanceHandler - Ask the model for an Istikhara verse and its meaning.
//!
//! The handler never fails from the caller's point of view. Every error is
//! logged and replaced by the fixed fallback result.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::guidance::{
    build_guidance_prompt, fallback_result, guidance_response_schema, GuidanceResult,
    UserIntention, API_KEY_ENV_VAR, GUIDANCE_TEMPERATURE,
};
use crate::ports::{AIError, AIProvider, CompletionRequest, RequestMetadata};

/// Command to request guidance for one intention.
#[derive(Debug, Clone, Default)]
pub struct RequestGuidanceCommand {
    pub intention: UserIntention,
    /// Optional trace id supplied by the caller (e.g. an HTTP request id).
    pub trace_id: Option<String>,
}

impl RequestGuidanceCommand {
    pub fn new(intention: impl Into<UserIntention>) -> Self {
        Self {
            intention: intention.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// Reasons a model answer could not be used.
///
/// Internal to the handler: callers only ever see a `GuidanceResult`.
#[derive(Debug, Clone, Error)]
pub enum GuidanceError {
    /// No credential configured for the provider.
    #[error("AI provider is not configured: {0}")]
    Configuration(String),

    /// The provider call itself failed.
    #[error("AI provider call failed: {0}")]
    Provider(AIError),

    /// The provider answered with nothing.
    #[error("AI provider returned an empty response")]
    EmptyResponse,

    /// The payload is not a usable guidance result.
    #[error("could not decode guidance payload: {0}")]
    Decode(String),
}

impl From<AIError> for GuidanceError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::NotConfigured(message) => GuidanceError::Configuration(message),
            other => GuidanceError::Provider(other),
        }
    }
}

impl GuidanceError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GuidanceError::Configuration(_) => "configuration",
            GuidanceError::Provider(_) => "provider",
            GuidanceError::EmptyResponse => "empty_response",
            GuidanceError::Decode(_) => "decode",
        }
    }

    /// Returns true if fixing the API key setting is the likely remedy.
    pub fn is_credential_problem(&self) -> bool {
        match self {
            GuidanceError::Configuration(_) => true,
            GuidanceError::Provider(err) => err.is_credential_problem(),
            GuidanceError::EmptyResponse | GuidanceError::Decode(_) => false,
        }
    }
}

/// Handler for guidance requests.
///
/// Stateless between calls: nothing is cached, so the same intention may
/// yield a different verse each time.
pub struct RequestGuidanceHandler {
    provider: Arc<dyn AIProvider>,
}

impl RequestGuidanceHandler {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    /// Requests guidance. Always resolves to a complete result; failures
    /// resolve to the fallback.
    pub async fn handle(&self, cmd: RequestGuidanceCommand) -> GuidanceResult {
        let metadata = cmd
            .trace_id
            .clone()
            .map(RequestMetadata::with_trace_id)
            .unwrap_or_default();
        let trace_id = metadata.trace_id.clone();

        match self.try_handle(&cmd.intention, metadata).await {
            Ok(result) => {
                tracing::info!(
                    trace_id = %trace_id,
                    surah = %result.surah_name,
                    verse = result.verse_number,
                    outcome = %result.outcome_class,
                    "Guidance received"
                );
                result
            }
            Err(err) => {
                if err.is_credential_problem() {
                    tracing::error!(
                        trace_id = %trace_id,
                        kind = err.kind(),
                        error = %err,
                        "Guidance request failed; check that {} is set to a valid key",
                        API_KEY_ENV_VAR
                    );
                } else {
                    tracing::warn!(
                        trace_id = %trace_id,
                        kind = err.kind(),
                        error = %err,
                        "Guidance request failed; returning fallback"
                    );
                }
                fallback_result()
            }
        }
    }

    async fn try_handle(
        &self,
        intention: &UserIntention,
        metadata: RequestMetadata,
    ) -> Result<GuidanceResult, GuidanceError> {
        let request = CompletionRequest::new(build_guidance_prompt(intention))
            .with_json_schema(guidance_response_schema())
            .with_temperature(GUIDANCE_TEMPERATURE)
            .with_metadata(metadata);

        let response = self.provider.complete(request).await?;
        decode_guidance_payload(&response.content)
    }
}

/// Decodes a model payload into a guidance result.
///
/// Rejects blank payloads, invalid JSON, missing fields, blank text fields,
/// verse number `0` and the reserved `ERROR` outcome. Accepted values are
/// returned as-is.
pub fn decode_guidance_payload(payload: &str) -> Result<GuidanceResult, GuidanceError> {
    if payload.trim().is_empty() {
        return Err(GuidanceError::EmptyResponse);
    }

    let result: GuidanceResult =
        serde_json::from_str(payload).map_err(|e| GuidanceError::Decode(e.to_string()))?;

    let text_fields = [
        ("surahName", &result.surah_name),
        ("arabicText", &result.arabic_text),
        ("translatedText", &result.translated_text),
        ("briefSummary", &result.brief_summary),
        ("interpretation", &result.interpretation),
    ];
    if let Some((name, _)) = text_fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(GuidanceError::Decode(format!("field '{}' is empty", name)));
    }

    if result.verse_number == 0 {
        return Err(GuidanceError::Decode(
            "field 'verseNumber' must be positive".to_string(),
        ));
    }

    if !result.outcome_class.is_model_outcome() {
        return Err(GuidanceError::Decode(format!(
            "field 'outcomeClass' has reserved value {}",
            result.outcome_class
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, DEFAULT_GUIDANCE_JSON};
    use crate::domain::guidance::{OutcomeClass, GENERAL_GUIDANCE_PLACEHOLDER, GUIDANCE_FIELDS};
    use crate::ports::ResponseFormat;
    use serde_json::{json, Value};

    fn valid_payload() -> Value {
        serde_json::from_str(DEFAULT_GUIDANCE_JSON).unwrap()
    }

    fn handler_with(provider: &MockAIProvider) -> RequestGuidanceHandler {
        RequestGuidanceHandler::new(Arc::new(provider.clone()))
    }

    #[tokio::test]
    async fn returns_model_payload_verbatim() {
        let payload = json!({
            "surahName": "یوسف",
            "verseNumber": 87,
            "arabicText": "وَلَا تَيْأَسُوا مِن رَّوْحِ اللَّهِ",
            "translatedText": "و از رحمت خدا نومید مشوید",
            "outcomeClass": "MIXED",
            "briefSummary": "میانه است - با احتیاط",
            "interpretation": "  صبر کنید و سپس اقدام کنید.  "
        });
        let provider = MockAIProvider::new().with_response(payload.to_string());
        let handler = handler_with(&provider);

        let result = handler.handle(RequestGuidanceCommand::new("سفر")).await;

        assert_eq!(serde_json::to_value(&result).unwrap(), payload);
        assert_eq!(result.interpretation, "  صبر کنید و سپس اقدام کنید.  ");
        assert_eq!(result.outcome_class, OutcomeClass::Mixed);
    }

    #[tokio::test]
    async fn sends_schema_constrained_high_temperature_request() {
        let provider = MockAIProvider::new();
        let handler = handler_with(&provider);

        handler.handle(RequestGuidanceCommand::new("خرید خانه")).await;

        let calls = provider.get_calls();
        assert_eq!(calls.len(), 1);
        let request = &calls[0];
        assert_eq!(request.temperature, Some(GUIDANCE_TEMPERATURE));
        assert!(request.prompt.contains("\"خرید خانه\""));
        match &request.response_format {
            ResponseFormat::Json { schema } => {
                assert_eq!(schema, &guidance_response_schema());
                assert_eq!(schema["required"].as_array().unwrap().len(), GUIDANCE_FIELDS.len());
            }
            ResponseFormat::Text => panic!("expected a JSON response format"),
        }
    }

    #[tokio::test]
    async fn empty_intention_uses_placeholder_in_prompt() {
        let provider = MockAIProvider::new();
        let handler = handler_with(&provider);

        let result = handler.handle(RequestGuidanceCommand::new("")).await;

        let prompt = &provider.get_calls()[0].prompt;
        assert!(!prompt.contains("\"\""));
        assert!(prompt.contains(GENERAL_GUIDANCE_PLACEHOLDER));
        assert!(!result.is_fallback());
    }

    #[tokio::test]
    async fn uses_caller_trace_id() {
        let provider = MockAIProvider::new();
        let handler = handler_with(&provider);

        handler
            .handle(RequestGuidanceCommand::new("x").with_trace_id("req-42"))
            .await;

        assert_eq!(provider.get_calls()[0].metadata.trace_id, "req-42");
    }

    #[tokio::test]
    async fn provider_failure_returns_fallback() {
        for error in [
            AIError::not_configured("missing key"),
            AIError::authentication("API key not valid"),
            AIError::rate_limited(30),
            AIError::unavailable("503"),
            AIError::network("connection refused"),
            AIError::Timeout { timeout_secs: 60 },
            AIError::content_filtered("SAFETY"),
        ] {
            let provider = MockAIProvider::new().with_error(error);
            let result = handler_with(&provider)
                .handle(RequestGuidanceCommand::new("x"))
                .await;
            assert_eq!(result, fallback_result());
        }
    }

    #[tokio::test]
    async fn empty_response_returns_fallback() {
        let provider = MockAIProvider::new().with_response("  \n ");
        let result = handler_with(&provider)
            .handle(RequestGuidanceCommand::new("x"))
            .await;
        assert_eq!(result, fallback_result());
    }

    #[tokio::test]
    async fn missing_field_returns_fallback() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("interpretation");
        let provider = MockAIProvider::new().with_response(payload.to_string());

        let result = handler_with(&provider)
            .handle(RequestGuidanceCommand::new("x"))
            .await;

        assert_eq!(result, fallback_result());
    }

    #[tokio::test]
    async fn repeated_failures_yield_equal_fallbacks() {
        let provider = MockAIProvider::new()
            .with_error(AIError::network("down"))
            .with_error(AIError::network("down"))
            .with_error(AIError::network("down"));
        let handler = handler_with(&provider);

        let first = handler.handle(RequestGuidanceCommand::new("x")).await;
        let second = handler.handle(RequestGuidanceCommand::new("x")).await;
        let third = handler.handle(RequestGuidanceCommand::new("y")).await;

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(first.outcome_class, OutcomeClass::Error);
    }

    #[test]
    fn decode_rejects_blank_payload() {
        assert!(matches!(
            decode_guidance_payload(""),
            Err(GuidanceError::EmptyResponse)
        ));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(
            decode_guidance_payload("Here is your verse: ..."),
            Err(GuidanceError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_each_missing_field() {
        for field in GUIDANCE_FIELDS {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(field);
            let err = decode_guidance_payload(&payload.to_string()).unwrap_err();
            assert!(matches!(err, GuidanceError::Decode(_)), "field {}", field);
        }
    }

    #[test]
    fn decode_rejects_blank_text_field() {
        let mut payload = valid_payload();
        payload["briefSummary"] = json!("   ");
        let err = decode_guidance_payload(&payload.to_string()).unwrap_err();
        assert!(matches!(err, GuidanceError::Decode(ref m) if m.contains("briefSummary")));
    }

    #[test]
    fn decode_rejects_zero_and_negative_verse() {
        let mut payload = valid_payload();
        payload["verseNumber"] = json!(0);
        assert!(decode_guidance_payload(&payload.to_string()).is_err());

        payload["verseNumber"] = json!(-4);
        assert!(decode_guidance_payload(&payload.to_string()).is_err());
    }

    #[test]
    fn decode_rejects_reserved_and_unknown_outcomes() {
        let mut payload = valid_payload();
        payload["outcomeClass"] = json!("ERROR");
        assert!(decode_guidance_payload(&payload.to_string()).is_err());

        payload["outcomeClass"] = json!("GOOD");
        assert!(decode_guidance_payload(&payload.to_string()).is_err());
    }

    #[test]
    fn not_configured_maps_to_configuration_error() {
        let err: GuidanceError = AIError::not_configured("missing").into();
        assert!(matches!(err, GuidanceError::Configuration(_)));
        assert_eq!(err.kind(), "configuration");
        assert!(err.is_credential_problem());
    }

    #[test]
    fn credential_classification_follows_provider_error() {
        let auth: GuidanceError = AIError::authentication("bad key").into();
        assert!(auth.is_credential_problem());

        let network: GuidanceError = AIError::network("reset").into();
        assert!(!network.is_credential_problem());
        assert_eq!(network.kind(), "provider");

        assert!(!GuidanceError::EmptyResponse.is_credential_problem());
    }
}
