//! HTTP handlers for guidance endpoints.
//!
//! These handlers connect Axum routes to the guidance request handler.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::HeaderMap;

use crate::application::handlers::{RequestGuidanceCommand, RequestGuidanceHandler};
use crate::domain::guidance::GuidanceResult;
use crate::ports::AIProvider;

use super::dto::{GuidanceRequest, HealthResponse};

/// Header a caller may use to correlate its request with our logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest request id accepted as a trace id.
pub const MAX_REQUEST_ID_LEN: usize = 128;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct GuidanceAppState {
    pub provider: Arc<dyn AIProvider>,
}

impl GuidanceAppState {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    pub fn request_guidance_handler(&self) -> RequestGuidanceHandler {
        RequestGuidanceHandler::new(self.provider.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/guidance - Perform an Istikhara for the given intention
///
/// Always answers 200 with a complete result. Provider failures show up as
/// the fallback result (`outcomeClass = ERROR`), never as an error status.
pub async fn request_guidance(
    State(state): State<GuidanceAppState>,
    headers: HeaderMap,
    Json(request): Json<GuidanceRequest>,
) -> Json<GuidanceResult> {
    let mut cmd = RequestGuidanceCommand::new(request.intention);
    if let Some(request_id) = request_id(&headers) {
        cmd = cmd.with_trace_id(request_id);
    }

    let result = state.request_guidance_handler().handle(cmd).await;
    Json(result)
}

/// Caller-supplied request id, if it is usable as a log field.
///
/// Ids longer than [`MAX_REQUEST_ID_LEN`] or containing anything other than
/// ASCII letters, digits, `-`, `_`, `.` or `:` are ignored and a fresh trace
/// id is generated instead.
fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .filter(|v| {
            v.bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
        })
}

/// GET /health - Liveness plus provider configuration status
pub async fn health(State(state): State<GuidanceAppState>) -> Json<HealthResponse> {
    Json(state.provider.provider_info().into())
}
