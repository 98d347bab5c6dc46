//! Guidance domain - the Istikhara response contract and its pure helpers.
//!
//! - `GuidanceResult` / `OutcomeClass` - the shape every caller renders
//! - `UserIntention` - the user's free-text intention and its normalization
//! - `build_guidance_prompt` - the instruction sent to the model
//! - `guidance_response_schema` - the structured-output constraint
//! - `fallback_result` - the fixed answer used when the model call fails

mod fallback;
mod intention;
mod prompt;
mod result;
mod schema;

pub use fallback::{fallback_result, API_KEY_ENV_VAR};
pub use intention::{UserIntention, GENERAL_GUIDANCE_PLACEHOLDER};
pub use prompt::{build_guidance_prompt, GUIDANCE_TEMPERATURE};
pub use result::{GuidanceResult, OutcomeClass};
pub use schema::{guidance_response_schema, GUIDANCE_FIELDS};
