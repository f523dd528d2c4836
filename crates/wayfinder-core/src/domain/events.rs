use crate::domain::node::{DisplayPoint, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The editing mode currently active, as exposed to the presentation
/// layer for enabling and disabling UI affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorModeKind {
    /// No edit in progress
    Idle,
    /// Placing a provisional node
    AddingNode,
    /// Accumulating a node deletion set
    DeletingNode,
    /// Editing a single node's fields and position
    EditingNode,
    /// Picking the two endpoints of a new edge
    AddingEdge,
    /// Accumulating an edge deletion set
    DeletingEdge,
    /// Retargeting a single edge's endpoints
    EditingEdge,
}

/// Whether a reported error aborts the in-progress operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The current mode is preserved; the user can correct the input
    Recoverable,
    /// The in-progress operation was aborted
    Fatal,
}

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: the editor changed mode
#[derive(Debug)]
pub struct ModeChanged {
    /// The mode that was active before
    pub from: EditorModeKind,

    /// The mode that is active now
    pub to: EditorModeKind,

    /// The timestamp when the mode changed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for ModeChanged {
    fn event_type(&self) -> &'static str {
        "editor.mode_changed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: a node's projected display position changed
///
/// Emitted after any mutation that moves a node so the presentation layer
/// can redraw it and its incident edges.
#[derive(Debug)]
pub struct NodeProjected {
    /// The node whose projection changed
    pub node_id: NodeId,

    /// The new display position
    pub display: DisplayPoint,

    /// The timestamp when the position changed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for NodeProjected {
    fn event_type(&self) -> &'static str {
        "editor.node_projected"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: user input was rejected
#[derive(Debug)]
pub struct EditRejected {
    /// Human-readable description of what was wrong
    pub message: String,

    /// Whether the in-progress edit survived the rejection
    pub severity: Severity,

    /// The timestamp when the input was rejected
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for EditRejected {
    fn event_type(&self) -> &'static str {
        "editor.edit_rejected"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_changed_event() {
        let timestamp = Utc::now();
        let event = ModeChanged {
            from: EditorModeKind::Idle,
            to: EditorModeKind::AddingNode,
            timestamp,
        };

        assert_eq!(event.event_type(), "editor.mode_changed");
        assert_eq!(event.timestamp(), timestamp);
        assert_eq!(event.from, EditorModeKind::Idle);
        assert_eq!(event.to, EditorModeKind::AddingNode);
    }

    #[test]
    fn test_node_projected_event() {
        let timestamp = Utc::now();
        let event = NodeProjected {
            node_id: NodeId("ZHALL00101".to_string()),
            display: DisplayPoint::new(6.7, 6.7),
            timestamp,
        };

        assert_eq!(event.event_type(), "editor.node_projected");
        assert_eq!(event.timestamp(), timestamp);
    }

    #[test]
    fn test_edit_rejected_event() {
        let timestamp = Utc::now();
        let event = EditRejected {
            message: "Invalid input".to_string(),
            severity: Severity::Recoverable,
            timestamp,
        };

        assert_eq!(event.event_type(), "editor.edit_rejected");
        assert_eq!(event.severity, Severity::Recoverable);
    }
}
