/// Calendar helpers producing the day key.
pub mod calendar;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Fixed delays pacing guess resolution.
pub mod pacing;
/// Presentation events and their sinks.
pub mod presentation;
/// Task owning the session and sequencing player intents.
pub mod session_runtime;
/// Session controller binding catalog, storage and state machine.
pub mod session_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
