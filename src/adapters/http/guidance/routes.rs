//! Route configuration for guidance endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, request_guidance, GuidanceAppState};

/// Creates the guidance router.
///
/// Routes:
/// - `POST /api/guidance` - Request guidance for an intention
/// - `GET /health` - Liveness and provider status
pub fn guidance_router() -> Router<GuidanceAppState> {
    Router::new()
        .route("/api/guidance", post(request_guidance))
        .route("/health", get(health))
}
