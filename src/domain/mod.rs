//! Domain layer containing business types and pure logic.
//!
//! # Module Organization
//!
//! - `guidance` - The guidance result contract, prompt, schema and fallback

pub mod guidance;
