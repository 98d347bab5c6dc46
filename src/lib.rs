//! Istikhara - AI-assisted Quranic guidance service
//!
//! A user states an intention; a generative model picks a verse, classifies
//! what it implies and interprets it. Any failure degrades to a fixed
//! fallback result, so callers always receive a complete answer.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
