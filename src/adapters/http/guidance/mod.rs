//! HTTP adapter for the guidance flow.
//!
//! Exposes the guidance request handler to a browser front end.

mod dto;
mod handlers;
mod routes;

pub use dto::{GuidanceRequest, HealthResponse};
pub use handlers::{GuidanceAppState, MAX_REQUEST_ID_LEN, REQUEST_ID_HEADER};
pub use routes::guidance_router;
