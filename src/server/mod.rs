//! HTTP server for the EduVoice API.

pub mod api;
pub mod app;
pub mod errors;
pub mod tracing;
