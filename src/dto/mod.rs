/// Health check payloads.
pub mod health;
/// Session views and intent payloads.
pub mod session;
/// Event stream payloads.
pub mod sse;
