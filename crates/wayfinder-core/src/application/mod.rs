//! Application services - core application logic

/// The editable floor projection
pub mod graph_session;

/// The map editing state machine
pub mod editor;

/// The request lifecycle and staff registry
pub mod request_service;
