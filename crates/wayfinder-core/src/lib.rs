//!
//! Wayfinder Core - map-editing and service-request engine
//!
//! This crate defines the domain models, store traits, and application
//! services behind the Wayfinder map editor: the floor projection, the
//! editing state machine that commits to the node and edge stores only on
//! explicit confirm, and the service-request lifecycle. Persistence and
//! presentation are external collaborators.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - core business models, entities, and rules
pub mod domain;

/// Application services - core application logic
pub mod application;

/// Session configuration
pub mod config;

/// Error types
pub mod error;

// Re-export key types
pub use config::{ProjectionScale, SessionConfig};
pub use error::CoreError;

// Re-export main API types for easy use
pub use application::editor::{EdgeEdit, EditorMode, MapEditor, NodeDraft, NodeEdit};
pub use application::graph_session::{GraphSession, UiEdge, UiNode};
pub use application::request_service::RequestService;
pub use domain::employee::{Employee, EmployeeId, EmployeeRole};
pub use domain::events::{DomainEvent, EditorModeKind, Severity};
pub use domain::node::{DisplayPoint, Edge, NewNode, Node, NodeId};
pub use domain::repository::{MapRepository, StaffRepository};
pub use domain::request::{Request, RequestId, RequestKind, RequestStatus, Service};
