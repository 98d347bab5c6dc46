//! HTTP DTOs (Data Transfer Objects) for guidance endpoints.
//!
//! The guidance response body is the `GuidanceResult` itself, so only the
//! request and health shapes live here.

use serde::{Deserialize, Serialize};

use crate::ports::ProviderInfo;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request body for `POST /api/guidance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuidanceRequest {
    /// The user's intention. Missing or blank means general guidance.
    #[serde(default)]
    pub intention: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub model: String,
    /// Whether the provider has a credential. A `false` here still answers
    /// requests, with the fallback result.
    pub configured: bool,
}

impl From<ProviderInfo> for HealthResponse {
    fn from(info: ProviderInfo) -> Self {
        Self {
            status: "ok".to_string(),
            provider: info.name,
            model: info.model,
            configured: info.configured,
        }
    }
}
