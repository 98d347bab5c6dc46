//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through ports.

mod request_guidance;

pub use request_guidance::{
    decode_guidance_payload, GuidanceError, RequestGuidanceCommand, RequestGuidanceHandler,
};
