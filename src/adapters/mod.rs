//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Generative model providers (Gemini, mock)
//! - `http` - REST endpoints for the presentation layer

pub mod ai;
pub mod http;

pub use ai::{GeminiConfig, GeminiProvider, MockAIProvider};
pub use http::{build_app, GuidanceAppState};
