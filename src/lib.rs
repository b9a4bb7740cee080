//! Library crate for hiburim-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Data access: catalog, storage backends and persisted entities.
pub mod dao;
/// Wire types shared by the HTTP and SSE surfaces.
pub mod dto;
/// Error types for the service and HTTP layers.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Session orchestration and supporting services.
pub mod services;
/// Application state, puzzle model and session state machine.
pub mod state;
