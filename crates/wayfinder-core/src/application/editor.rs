use crate::application::graph_session::GraphSession;
use crate::config::SessionConfig;
use crate::domain::events::{
    DomainEvent, EditRejected, EditorModeKind, ModeChanged, NodeProjected, Severity,
};
use crate::domain::node::{DisplayPoint, Edge, NewNode, NodeId};
use crate::domain::repository::MapRepository;
use crate::CoreError;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// A provisional node that exists only in the editor until confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    /// Where the provisional node currently sits in display space
    pub display: DisplayPoint,

    /// Category tag entered so far
    pub node_type: String,

    /// Long name entered so far
    pub long_name: String,

    /// Short name entered so far
    pub short_name: String,
}

/// The single node pending changes in edit-node mode
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEdit {
    /// Id of the node being edited
    pub node_id: NodeId,

    /// Uncommitted display position
    pub display: DisplayPoint,

    /// Uncommitted long name
    pub long_name: String,

    /// Uncommitted short name
    pub short_name: String,
}

/// The single edge pending a retarget in edit-edge mode
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEdit {
    /// The committed edge being retargeted
    pub original: Edge,

    /// Uncommitted first endpoint
    pub a: NodeId,

    /// Uncommitted second endpoint
    pub b: NodeId,
}

/// The active editing mode with its mode-local state
///
/// One enum with per-mode payload: the editor is in exactly one mode at a
/// time and mode-local state cannot outlive its mode.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    /// No edit in progress
    Idle,

    /// A provisional node is being placed
    AddingNode {
        /// The uncommitted node
        draft: NodeDraft,
    },

    /// Nodes are being accumulated for deletion
    DeletingNode {
        /// Ids accumulated so far, in selection order
        selected: Vec<NodeId>,
    },

    /// A single node's fields and position are being edited
    EditingNode {
        /// The pending edit, once a node has been picked
        target: Option<NodeEdit>,
    },

    /// The two endpoints of a new edge are being picked
    AddingEdge {
        /// First endpoint pick
        first: Option<NodeId>,
        /// Second endpoint pick
        second: Option<NodeId>,
    },

    /// Edges are being accumulated for deletion
    DeletingEdge {
        /// Edges accumulated so far, in selection order
        selected: Vec<Edge>,
    },

    /// A single edge's endpoints are being retargeted
    EditingEdge {
        /// The pending retarget, once an edge has been picked
        target: Option<EdgeEdit>,
    },
}

impl EditorMode {
    /// The fieldless kind of this mode, for UI affordances
    pub fn kind(&self) -> EditorModeKind {
        match self {
            EditorMode::Idle => EditorModeKind::Idle,
            EditorMode::AddingNode { .. } => EditorModeKind::AddingNode,
            EditorMode::DeletingNode { .. } => EditorModeKind::DeletingNode,
            EditorMode::EditingNode { .. } => EditorModeKind::EditingNode,
            EditorMode::AddingEdge { .. } => EditorModeKind::AddingEdge,
            EditorMode::DeletingEdge { .. } => EditorModeKind::DeletingEdge,
            EditorMode::EditingEdge { .. } => EditorModeKind::EditingEdge,
        }
    }
}

/// The map editing state machine
///
/// Classifies user actions against the active mode, validates them against
/// the loaded floor projection, and commits to the store only on an
/// explicit confirm. Cancel always discards mode-local state without
/// touching the store. All methods are synchronous except the ones that
/// perform store I/O (`load_floor`, `confirm`).
pub struct MapEditor {
    session: GraphSession,
    map_repo: Arc<dyn MapRepository>,
    mode: EditorMode,
    events: Vec<Box<dyn DomainEvent>>,
}

impl MapEditor {
    /// Create an editor over an empty session for the configured floor
    pub fn new(map_repo: Arc<dyn MapRepository>, config: &SessionConfig) -> Self {
        Self {
            session: GraphSession::new(map_repo.clone(), config),
            map_repo,
            mode: EditorMode::Idle,
            events: Vec::new(),
        }
    }

    /// The active mode with its payload
    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    /// The active mode kind, for UI affordances
    pub fn mode_kind(&self) -> EditorModeKind {
        self.mode.kind()
    }

    /// The floor projection the editor is operating on
    pub fn session(&self) -> &GraphSession {
        &self.session
    }

    /// Get and clear all recorded events
    pub fn take_events(&mut self) -> Vec<Box<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }

    /// Load a floor, discarding any in-progress edit first
    pub async fn load_floor(&mut self, floor: i32, building: &str) -> Result<(), CoreError> {
        self.cancel();
        self.session.load_floor(floor, building).await
    }

    /// Double-click on empty canvas: seed a provisional node at the click
    /// position and enter add-node mode
    pub fn double_click(&mut self, display: DisplayPoint) {
        if matches!(self.mode, EditorMode::AddingNode { .. }) {
            return;
        }
        self.enter(EditorMode::AddingNode {
            draft: NodeDraft {
                display,
                node_type: String::new(),
                long_name: String::new(),
                short_name: String::new(),
            },
        });
    }

    /// Menu selection: enter delete-node mode
    pub fn begin_delete_node(&mut self) {
        self.enter(EditorMode::DeletingNode {
            selected: Vec::new(),
        });
    }

    /// Menu selection: enter edit-node mode
    pub fn begin_edit_node(&mut self) {
        self.enter(EditorMode::EditingNode { target: None });
    }

    /// Menu selection: enter add-edge mode
    pub fn begin_add_edge(&mut self) {
        self.enter(EditorMode::AddingEdge {
            first: None,
            second: None,
        });
    }

    /// Menu selection: enter delete-edge mode
    pub fn begin_delete_edge(&mut self) {
        self.enter(EditorMode::DeletingEdge {
            selected: Vec::new(),
        });
    }

    /// Menu selection: enter edit-edge mode
    pub fn begin_edit_edge(&mut self) {
        self.enter(EditorMode::EditingEdge { target: None });
    }

    /// Discard all mode-local state and return to idle
    ///
    /// Never touches the store; moved nodes are restored to their
    /// committed positions.
    pub fn cancel(&mut self) {
        match self.mode.clone() {
            EditorMode::Idle => return,
            EditorMode::AddingNode { .. } => {
                // The draft was never persisted; dropping it is enough.
            }
            EditorMode::DeletingNode { selected } => {
                for id in &selected {
                    let _ = self.session.set_selected(id, false);
                }
            }
            EditorMode::EditingNode { target } => {
                if let Some(target) = target {
                    self.restore_and_report(&target.node_id);
                }
            }
            EditorMode::AddingEdge { first, second } => {
                for id in [first, second].into_iter().flatten() {
                    let _ = self.session.set_selected(&id, false);
                }
            }
            EditorMode::DeletingEdge { .. } => {}
            EditorMode::EditingEdge { .. } => {}
        }
        self.transition(EditorMode::Idle);
    }

    /// Commit the in-progress edit to the store and return to idle
    ///
    /// On validation failure the mode and its state are kept so the user
    /// can correct the input; on persistence failure the mode is kept so
    /// the user can retry or cancel.
    pub async fn confirm(&mut self) -> Result<(), CoreError> {
        match self.mode.clone() {
            EditorMode::Idle => Err(CoreError::InvalidState(
                "No edit in progress to confirm".to_string(),
            )),
            EditorMode::AddingNode { draft } => self.confirm_add_node(draft).await,
            EditorMode::DeletingNode { selected } => self.confirm_delete_nodes(selected).await,
            EditorMode::EditingNode { target } => self.confirm_edit_node(target).await,
            EditorMode::AddingEdge { first, second } => {
                self.confirm_add_edge(first, second).await
            }
            EditorMode::DeletingEdge { selected } => self.confirm_delete_edges(selected).await,
            EditorMode::EditingEdge { target } => self.confirm_edit_edge(target).await,
        }
    }

    // ----- add-node mode -----

    /// Drag the provisional node to a new display position
    pub fn drag_draft(&mut self, display: DisplayPoint) -> Result<(), CoreError> {
        match &mut self.mode {
            EditorMode::AddingNode { draft } => {
                draft.display = display;
                Ok(())
            }
            _ => Err(CoreError::InvalidState(
                "Not in add-node mode".to_string(),
            )),
        }
    }

    /// Fill in the provisional node's text fields
    pub fn set_draft_details(
        &mut self,
        node_type: &str,
        long_name: &str,
        short_name: &str,
    ) -> Result<(), CoreError> {
        match &mut self.mode {
            EditorMode::AddingNode { draft } => {
                draft.node_type = node_type.to_string();
                draft.long_name = long_name.to_string();
                draft.short_name = short_name.to_string();
                Ok(())
            }
            _ => Err(CoreError::InvalidState(
                "Not in add-node mode".to_string(),
            )),
        }
    }

    /// Position the provisional node from typed coordinates
    ///
    /// Malformed numbers leave the last valid position in place and are
    /// reported without leaving the mode.
    pub fn set_draft_position_text(&mut self, x: &str, y: &str) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::AddingNode { .. }) {
            return Err(CoreError::InvalidState(
                "Not in add-node mode".to_string(),
            ));
        }
        match Self::parse_position(x, y) {
            Ok(display) => self.drag_draft(display),
            Err(err) => Err(self.reject(err)),
        }
    }

    // ----- delete-node mode -----

    /// Toggle a node's membership in the deletion set
    pub fn toggle_delete_selection(&mut self, id: &NodeId) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::DeletingNode { .. }) {
            return Err(CoreError::InvalidState(
                "Not in delete-node mode".to_string(),
            ));
        }
        if !self.session.contains(id) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Node {} is not on the loaded floor",
                id
            ))));
        }
        if let EditorMode::DeletingNode { selected } = &mut self.mode {
            if let Some(pos) = selected.iter().position(|s| s == id) {
                selected.remove(pos);
                self.session.set_selected(id, false)?;
            } else {
                selected.push(id.clone());
                self.session.set_selected(id, true)?;
            }
        }
        Ok(())
    }

    // ----- edit-node mode -----

    /// Make a node the active edit target
    ///
    /// Picking a second node while one is pending implicitly cancels the
    /// first, restoring its committed position and fields, before the new
    /// selection becomes active. Re-picking the current target keeps its
    /// pending edits.
    pub fn select_edit_node(&mut self, id: &NodeId) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::EditingNode { .. }) {
            return Err(CoreError::InvalidState(
                "Not in edit-node mode".to_string(),
            ));
        }
        if !self.session.contains(id) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Node {} is not on the loaded floor",
                id
            ))));
        }

        let previous = match &self.mode {
            EditorMode::EditingNode { target } => target.clone(),
            _ => None,
        };
        if let Some(previous) = previous {
            if previous.node_id == *id {
                return Ok(());
            }
            self.restore_and_report(&previous.node_id);
        }

        let source = self.session.lookup_source(id)?.clone();
        let display = self
            .session
            .ui_node(id)
            .map(|n| n.display)
            .ok_or_else(|| {
                CoreError::InvariantViolation(format!("Node {} vanished from projection", id))
            })?;
        self.session.set_selected(id, true)?;
        self.mode = EditorMode::EditingNode {
            target: Some(NodeEdit {
                node_id: id.clone(),
                display,
                long_name: source.long_name,
                short_name: source.short_name,
            }),
        };
        Ok(())
    }

    /// Drag the edit target to a new display position
    ///
    /// Local until confirm; edges touching the node follow immediately.
    pub fn drag_edit_node(&mut self, display: DisplayPoint) -> Result<(), CoreError> {
        let id = self.require_edit_target()?;
        self.session.move_node(&id, display)?;
        if let EditorMode::EditingNode { target: Some(target) } = &mut self.mode {
            target.display = display;
        }
        self.record_event(Box::new(NodeProjected {
            node_id: id,
            display,
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Position the edit target from typed coordinates
    ///
    /// Malformed numbers revert the displayed value to the last valid
    /// position and are reported without leaving the mode.
    pub fn set_edit_position_text(&mut self, x: &str, y: &str) -> Result<(), CoreError> {
        let id = self.require_edit_target()?;
        match Self::parse_position(x, y) {
            Ok(display) => self.drag_edit_node(display),
            Err(err) => {
                if let Some(current) = self.session.ui_node(&id).map(|n| n.display) {
                    self.record_event(Box::new(NodeProjected {
                        node_id: id,
                        display: current,
                        timestamp: Utc::now(),
                    }));
                }
                Err(self.reject(err))
            }
        }
    }

    /// Update the edit target's pending names
    pub fn set_edit_names(&mut self, long_name: &str, short_name: &str) -> Result<(), CoreError> {
        self.require_edit_target()?;
        if let EditorMode::EditingNode { target: Some(target) } = &mut self.mode {
            target.long_name = long_name.to_string();
            target.short_name = short_name.to_string();
        }
        Ok(())
    }

    // ----- add-edge mode -----

    /// Pick the next endpoint of the new edge
    pub fn pick_edge_endpoint(&mut self, id: &NodeId) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::AddingEdge { .. }) {
            return Err(CoreError::InvalidState(
                "Not in add-edge mode".to_string(),
            ));
        }
        if !self.session.contains(id) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Node {} is not on the loaded floor",
                id
            ))));
        }

        let (first, second) = match &self.mode {
            EditorMode::AddingEdge { first, second } => (first.clone(), second.clone()),
            _ => unreachable!(),
        };
        if first.as_ref() == Some(id) || second.as_ref() == Some(id) {
            return Err(self.reject(CoreError::Validation(format!(
                "Node {} is already an endpoint of the new edge",
                id
            ))));
        }
        if first.is_some() && second.is_some() {
            return Err(self.reject(CoreError::Validation(
                "Both endpoints are already picked; confirm or cancel".to_string(),
            )));
        }

        self.session.set_selected(id, true)?;
        if let EditorMode::AddingEdge { first, second } = &mut self.mode {
            if first.is_none() {
                *first = Some(id.clone());
            } else {
                *second = Some(id.clone());
            }
        }
        Ok(())
    }

    // ----- delete-edge mode -----

    /// Toggle an edge's membership in the deletion set
    pub fn toggle_edge_selection(&mut self, a: &NodeId, b: &NodeId) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::DeletingEdge { .. }) {
            return Err(CoreError::InvalidState(
                "Not in delete-edge mode".to_string(),
            ));
        }
        let edge = Edge::new(a.clone(), b.clone());
        if !self.session.ui_edges().iter().any(|e| e.edge == edge) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Edge {}-{} is not on the loaded floor",
                edge.a, edge.b
            ))));
        }
        if let EditorMode::DeletingEdge { selected } = &mut self.mode {
            if let Some(pos) = selected.iter().position(|s| s == &edge) {
                selected.remove(pos);
            } else {
                selected.push(edge);
            }
        }
        Ok(())
    }

    // ----- edit-edge mode -----

    /// Make an edge the active retarget
    ///
    /// Picking a second edge discards the first's pending retarget.
    pub fn select_edit_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<(), CoreError> {
        if !matches!(self.mode, EditorMode::EditingEdge { .. }) {
            return Err(CoreError::InvalidState(
                "Not in edit-edge mode".to_string(),
            ));
        }
        let edge = Edge::new(a.clone(), b.clone());
        if !self.session.ui_edges().iter().any(|e| e.edge == edge) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Edge {}-{} is not on the loaded floor",
                edge.a, edge.b
            ))));
        }
        self.mode = EditorMode::EditingEdge {
            target: Some(EdgeEdit {
                a: edge.a.clone(),
                b: edge.b.clone(),
                original: edge,
            }),
        };
        Ok(())
    }

    /// Swap one endpoint of the pending retarget for another node
    pub fn retarget_edge_endpoint(
        &mut self,
        old_end: &NodeId,
        new_end: &NodeId,
    ) -> Result<(), CoreError> {
        let target = match &self.mode {
            EditorMode::EditingEdge { target: Some(target) } => target.clone(),
            EditorMode::EditingEdge { target: None } => {
                return Err(self.reject(CoreError::Validation(
                    "No edge selected to edit".to_string(),
                )))
            }
            _ => {
                return Err(CoreError::InvalidState(
                    "Not in edit-edge mode".to_string(),
                ))
            }
        };
        if !self.session.contains(new_end) {
            return Err(self.reject(CoreError::NotFound(format!(
                "Node {} is not on the loaded floor",
                new_end
            ))));
        }
        let (a, b) = if target.a == *old_end {
            (new_end.clone(), target.b.clone())
        } else if target.b == *old_end {
            (target.a.clone(), new_end.clone())
        } else {
            return Err(self.reject(CoreError::Validation(format!(
                "Node {} is not an endpoint of the selected edge",
                old_end
            ))));
        };
        if a == b {
            return Err(self.reject(CoreError::Validation(
                "An edge cannot connect a node to itself".to_string(),
            )));
        }
        if let EditorMode::EditingEdge { target: Some(target) } = &mut self.mode {
            target.a = a;
            target.b = b;
        }
        Ok(())
    }

    // ----- confirm paths -----

    async fn confirm_add_node(&mut self, draft: NodeDraft) -> Result<(), CoreError> {
        if draft.node_type.trim().is_empty()
            || draft.long_name.trim().is_empty()
            || draft.short_name.trim().is_empty()
        {
            return Err(self.reject(CoreError::Validation(
                "Type, long name and short name are all required".to_string(),
            )));
        }

        let (x, y) = self.session.unproject(draft.display);
        let fields = NewNode {
            x,
            y,
            floor: self.session.floor(),
            building: self.session.building().to_string(),
            node_type: draft.node_type.trim().to_string(),
            long_name: draft.long_name.trim().to_string(),
            short_name: draft.short_name.trim().to_string(),
        };

        let node = match self.map_repo.add_node(fields).await {
            Ok(node) => node,
            Err(err) => return Err(self.reject(err)),
        };
        info!(node_id = %node.id, x = node.x, y = node.y, "Node committed");

        let display = self.session.apply_added(node.clone());
        self.record_event(Box::new(NodeProjected {
            node_id: node.id,
            display,
            timestamp: Utc::now(),
        }));
        self.transition(EditorMode::Idle);
        Ok(())
    }

    async fn confirm_delete_nodes(&mut self, selected: Vec<NodeId>) -> Result<(), CoreError> {
        let count = selected.len();
        for id in selected {
            if let Err(err) = self.map_repo.delete_node(&id).await {
                return Err(self.reject(err));
            }
            self.session.apply_removed(&id);
            if let EditorMode::DeletingNode { selected } = &mut self.mode {
                selected.retain(|s| s != &id);
            }
        }
        info!(nodes = count, "Deletion set committed");
        self.transition(EditorMode::Idle);
        Ok(())
    }

    async fn confirm_edit_node(&mut self, target: Option<NodeEdit>) -> Result<(), CoreError> {
        let target = match target {
            Some(target) => target,
            None => {
                return Err(self.reject(CoreError::Validation(
                    "No node selected to edit".to_string(),
                )))
            }
        };
        if target.long_name.trim().is_empty() || target.short_name.trim().is_empty() {
            return Err(self.reject(CoreError::Validation(
                "Long name and short name are both required".to_string(),
            )));
        }

        let (x, y) = self.session.unproject(target.display);
        let long_name = target.long_name.trim().to_string();
        let short_name = target.short_name.trim().to_string();
        if let Err(err) = self
            .map_repo
            .modify_node(&target.node_id, x, y, &long_name, &short_name)
            .await
        {
            return Err(self.reject(err));
        }
        info!(node_id = %target.node_id, x = x, y = y, "Node edit committed");

        let display = match self
            .session
            .apply_modified(&target.node_id, x, y, &long_name, &short_name)
        {
            Ok(display) => display,
            Err(err) => return Err(self.reject(err)),
        };
        self.record_event(Box::new(NodeProjected {
            node_id: target.node_id,
            display,
            timestamp: Utc::now(),
        }));
        self.transition(EditorMode::Idle);
        Ok(())
    }

    async fn confirm_add_edge(
        &mut self,
        first: Option<NodeId>,
        second: Option<NodeId>,
    ) -> Result<(), CoreError> {
        let (a, b) = match (first, second) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(self.reject(CoreError::Validation(
                    "An edge needs two endpoints".to_string(),
                )))
            }
        };

        let edge = match self.map_repo.add_edge(&a, &b).await {
            Ok(edge) => edge,
            Err(err) => return Err(self.reject(err)),
        };
        info!(a = %edge.a, b = %edge.b, "Edge committed");

        if let Err(err) = self.session.apply_edge_added(edge) {
            return Err(self.reject(err));
        }
        let _ = self.session.set_selected(&a, false);
        let _ = self.session.set_selected(&b, false);
        self.transition(EditorMode::Idle);
        Ok(())
    }

    async fn confirm_delete_edges(&mut self, selected: Vec<Edge>) -> Result<(), CoreError> {
        let count = selected.len();
        for edge in selected {
            if let Err(err) = self.map_repo.remove_edge(&edge.a, &edge.b).await {
                return Err(self.reject(err));
            }
            self.session.apply_edge_removed(&edge);
            if let EditorMode::DeletingEdge { selected } = &mut self.mode {
                selected.retain(|s| s != &edge);
            }
        }
        info!(edges = count, "Edge deletion set committed");
        self.transition(EditorMode::Idle);
        Ok(())
    }

    async fn confirm_edit_edge(&mut self, target: Option<EdgeEdit>) -> Result<(), CoreError> {
        let target = match target {
            Some(target) => target,
            None => {
                return Err(self.reject(CoreError::Validation(
                    "No edge selected to edit".to_string(),
                )))
            }
        };

        let retargeted = Edge::new(target.a.clone(), target.b.clone());
        if retargeted == target.original {
            self.transition(EditorMode::Idle);
            return Ok(());
        }

        // Add the retargeted edge before removing the original; a failure
        // between the two must not drop connectivity.
        let edge = match self.map_repo.add_edge(&target.a, &target.b).await {
            Ok(edge) => edge,
            Err(err) => return Err(self.reject(err)),
        };
        if let Err(err) = self.session.apply_edge_added(edge.clone()) {
            return Err(self.reject(err));
        }
        if let Err(err) = self
            .map_repo
            .remove_edge(&target.original.a, &target.original.b)
            .await
        {
            return Err(self.reject(err));
        }
        self.session.apply_edge_removed(&target.original);
        info!(
            from_a = %target.original.a,
            from_b = %target.original.b,
            to_a = %edge.a,
            to_b = %edge.b,
            "Edge retarget committed"
        );
        self.transition(EditorMode::Idle);
        Ok(())
    }

    // ----- internals -----

    fn enter(&mut self, mode: EditorMode) {
        if !matches!(self.mode, EditorMode::Idle) {
            self.cancel();
        }
        self.transition(mode);
    }

    fn transition(&mut self, to: EditorMode) {
        let from = self.mode.kind();
        self.mode = to;
        let to_kind = self.mode.kind();
        if from != to_kind {
            debug!(from = ?from, to = ?to_kind, "Editor mode changed");
            self.record_event(Box::new(ModeChanged {
                from,
                to: to_kind,
                timestamp: Utc::now(),
            }));
        }
    }

    fn require_edit_target(&self) -> Result<NodeId, CoreError> {
        match &self.mode {
            EditorMode::EditingNode { target: Some(target) } => Ok(target.node_id.clone()),
            EditorMode::EditingNode { target: None } => Err(CoreError::Validation(
                "No node selected to edit".to_string(),
            )),
            _ => Err(CoreError::InvalidState(
                "Not in edit-node mode".to_string(),
            )),
        }
    }

    fn restore_and_report(&mut self, id: &NodeId) {
        if let Ok(display) = self.session.restore_node(id) {
            self.record_event(Box::new(NodeProjected {
                node_id: id.clone(),
                display,
                timestamp: Utc::now(),
            }));
        }
    }

    fn parse_position(x: &str, y: &str) -> Result<DisplayPoint, CoreError> {
        let x: f64 = x.trim().parse()?;
        let y: f64 = y.trim().parse()?;
        Ok(DisplayPoint::new(x, y))
    }

    fn reject(&mut self, err: CoreError) -> CoreError {
        let severity = if err.is_recoverable() {
            Severity::Recoverable
        } else {
            Severity::Fatal
        };
        self.record_event(Box::new(EditRejected {
            message: err.to_string(),
            severity,
            timestamp: Utc::now(),
        }));
        err
    }

    fn record_event(&mut self, event: Box<dyn DomainEvent>) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Node;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Mutable store double with a switch that makes every write fail,
    /// for exercising the persistence-failure paths.
    #[derive(Default)]
    struct MemoryMapRepository {
        nodes: Mutex<HashMap<String, Node>>,
        edges: Mutex<Vec<Edge>>,
        next_id: AtomicU32,
        fail_writes: AtomicBool,
    }

    impl MemoryMapRepository {
        fn check_writable(&self) -> Result<(), CoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(CoreError::Persistence("store unreachable".to_string()))
            } else {
                Ok(())
            }
        }

        fn snapshot(&self) -> (HashMap<String, Node>, Vec<Edge>) {
            (
                self.nodes.lock().unwrap().clone(),
                self.edges.lock().unwrap().clone(),
            )
        }
    }

    #[async_trait]
    impl MapRepository for MemoryMapRepository {
        async fn add_node(&self, fields: NewNode) -> Result<Node, CoreError> {
            self.check_writable()?;
            let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
            let node = Node {
                id: NodeId(format!("GEN{:05}", seq)),
                x: fields.x,
                y: fields.y,
                floor: fields.floor,
                building: fields.building,
                node_type: fields.node_type,
                long_name: fields.long_name,
                short_name: fields.short_name,
            };
            self.nodes
                .lock()
                .unwrap()
                .insert(node.id.0.clone(), node.clone());
            Ok(node)
        }

        async fn insert_node(&self, node: Node) -> Result<(), CoreError> {
            self.check_writable()?;
            let mut nodes = self.nodes.lock().unwrap();
            if nodes.contains_key(&node.id.0) {
                return Err(CoreError::Persistence(format!(
                    "Node id {} already exists",
                    node.id
                )));
            }
            nodes.insert(node.id.0.clone(), node);
            Ok(())
        }

        async fn node(&self, id: &NodeId) -> Result<Option<Node>, CoreError> {
            Ok(self.nodes.lock().unwrap().get(&id.0).cloned())
        }

        async fn modify_node(
            &self,
            id: &NodeId,
            x: i32,
            y: i32,
            long_name: &str,
            short_name: &str,
        ) -> Result<(), CoreError> {
            self.check_writable()?;
            let mut nodes = self.nodes.lock().unwrap();
            let node = nodes
                .get_mut(&id.0)
                .ok_or_else(|| CoreError::NotFound(format!("Node {}", id)))?;
            node.x = x;
            node.y = y;
            node.long_name = long_name.to_string();
            node.short_name = short_name.to_string();
            Ok(())
        }

        async fn delete_node(&self, id: &NodeId) -> Result<(), CoreError> {
            self.check_writable()?;
            let mut nodes = self.nodes.lock().unwrap();
            if nodes.remove(&id.0).is_none() {
                return Err(CoreError::NotFound(format!("Node {}", id)));
            }
            self.edges.lock().unwrap().retain(|e| !e.touches(id));
            Ok(())
        }

        async fn floor_nodes(&self, floor: i32, building: &str) -> Result<Vec<Node>, CoreError> {
            Ok(self
                .nodes
                .lock()
                .unwrap()
                .values()
                .filter(|n| n.floor == floor && n.building == building)
                .cloned()
                .collect())
        }

        async fn floor_edges(&self, floor: i32) -> Result<Vec<(Node, Node)>, CoreError> {
            let nodes = self.nodes.lock().unwrap();
            Ok(self
                .edges
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| {
                    let a = nodes.get(&e.a.0)?;
                    let b = nodes.get(&e.b.0)?;
                    (a.floor == floor && b.floor == floor).then(|| (a.clone(), b.clone()))
                })
                .collect())
        }

        async fn add_edge(&self, a: &NodeId, b: &NodeId) -> Result<Edge, CoreError> {
            self.check_writable()?;
            let nodes = self.nodes.lock().unwrap();
            for end in [a, b] {
                if !nodes.contains_key(&end.0) {
                    return Err(CoreError::NotFound(format!("Node {}", end)));
                }
            }
            let edge = Edge::new(a.clone(), b.clone());
            let mut edges = self.edges.lock().unwrap();
            if edges.contains(&edge) {
                return Err(CoreError::Persistence(format!(
                    "Edge {}-{} already exists",
                    edge.a, edge.b
                )));
            }
            edges.push(edge.clone());
            Ok(edge)
        }

        async fn remove_edge(&self, a: &NodeId, b: &NodeId) -> Result<(), CoreError> {
            self.check_writable()?;
            let edge = Edge::new(a.clone(), b.clone());
            let mut edges = self.edges.lock().unwrap();
            let before = edges.len();
            edges.retain(|e| e != &edge);
            if edges.len() == before {
                return Err(CoreError::NotFound(format!(
                    "Edge {}-{}",
                    edge.a, edge.b
                )));
            }
            Ok(())
        }
    }

    fn test_node(id: &str, x: i32, y: i32) -> Node {
        Node {
            id: NodeId(id.to_string()),
            x,
            y,
            floor: 4,
            building: "Faulkner".to_string(),
            node_type: "HALL".to_string(),
            long_name: format!("{} long", id),
            short_name: format!("{} short", id),
        }
    }

    async fn create_test_editor() -> (MapEditor, Arc<MemoryMapRepository>) {
        let repo = Arc::new(MemoryMapRepository::default());
        for node in [
            test_node("HALL1", 100, 200),
            test_node("HALL2", 300, 400),
            test_node("DEPT1", 500, 600),
        ] {
            repo.insert_node(node).await.unwrap();
        }
        repo.add_edge(&NodeId("HALL1".to_string()), &NodeId("HALL2".to_string()))
            .await
            .unwrap();

        let mut editor = MapEditor::new(repo.clone(), &SessionConfig::default());
        editor.load_floor(4, "Faulkner").await.unwrap();
        (editor, repo)
    }

    fn id(s: &str) -> NodeId {
        NodeId(s.to_string())
    }

    #[tokio::test]
    async fn test_double_click_seeds_provisional_node() {
        let (mut editor, _) = create_test_editor().await;
        editor.double_click(DisplayPoint::new(12.5, 40.0));

        assert_eq!(editor.mode_kind(), EditorModeKind::AddingNode);
        match editor.mode() {
            EditorMode::AddingNode { draft } => {
                assert_eq!(draft.display, DisplayPoint::new(12.5, 40.0));
                assert!(draft.long_name.is_empty());
            }
            _ => panic!("Expected AddingNode mode"),
        }
    }

    #[tokio::test]
    async fn test_add_node_confirm_rejects_missing_fields_and_keeps_input() {
        let (mut editor, repo) = create_test_editor().await;
        editor.double_click(DisplayPoint::new(10.0, 10.0));
        editor.set_draft_details("DEPT", "", "Short").unwrap();

        let result = editor.confirm().await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(editor.mode_kind(), EditorModeKind::AddingNode);
        match editor.mode() {
            EditorMode::AddingNode { draft } => assert_eq!(draft.short_name, "Short"),
            _ => panic!("Expected AddingNode mode"),
        }

        // Correcting the input and re-confirming commits exactly one node
        editor.set_draft_details("DEPT", "Radiology", "Rad").unwrap();
        editor.confirm().await.unwrap();
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
        assert_eq!(repo.snapshot().0.len(), 4);
    }

    #[tokio::test]
    async fn test_add_node_confirm_unprojects_to_store_coordinates() {
        let (mut editor, repo) = create_test_editor().await;
        let display = editor.session().project_coords(10, 10);
        editor.double_click(display);
        editor.set_draft_details("HALL", "HALLZ1", "HALLZ1").unwrap();
        editor.confirm().await.unwrap();

        let (nodes, _) = repo.snapshot();
        let committed = nodes.values().find(|n| n.long_name == "HALLZ1").unwrap();
        assert_eq!((committed.x, committed.y), (10, 10));
        assert_eq!(committed.floor, 4);
        assert_eq!(committed.building, "Faulkner");
    }

    #[tokio::test]
    async fn test_cancel_never_touches_the_store() {
        let (mut editor, repo) = create_test_editor().await;
        let before = repo.snapshot();

        editor.double_click(DisplayPoint::new(5.0, 5.0));
        editor.set_draft_details("HALL", "H", "H").unwrap();
        editor.cancel();

        editor.begin_delete_node();
        editor.toggle_delete_selection(&id("HALL1")).unwrap();
        editor.cancel();

        editor.begin_edit_node();
        editor.select_edit_node(&id("HALL1")).unwrap();
        editor.drag_edit_node(DisplayPoint::new(1.0, 1.0)).unwrap();
        editor.set_edit_names("renamed", "renamed").unwrap();
        editor.cancel();

        editor.begin_add_edge();
        editor.pick_edge_endpoint(&id("HALL1")).unwrap();
        editor.pick_edge_endpoint(&id("DEPT1")).unwrap();
        editor.cancel();

        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
        assert_eq!(repo.snapshot(), before);
        // The moved node is back at its committed position
        let committed = editor.session().project_coords(100, 200);
        assert_eq!(
            editor.session().ui_node(&id("HALL1")).unwrap().display,
            committed
        );
    }

    #[tokio::test]
    async fn test_delete_confirm_cascades_incident_edges() {
        let (mut editor, repo) = create_test_editor().await;
        editor.begin_delete_node();
        editor.toggle_delete_selection(&id("HALL1")).unwrap();
        editor.confirm().await.unwrap();

        let (nodes, edges) = repo.snapshot();
        assert!(!nodes.contains_key("HALL1"));
        assert!(edges.is_empty());
        assert!(!editor.session().contains(&id("HALL1")));
        assert!(editor.session().ui_edges().is_empty());
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
    }

    #[tokio::test]
    async fn test_toggle_delete_selection_deselects_on_second_click() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_delete_node();
        editor.toggle_delete_selection(&id("HALL1")).unwrap();
        editor.toggle_delete_selection(&id("HALL1")).unwrap();

        match editor.mode() {
            EditorMode::DeletingNode { selected } => assert!(selected.is_empty()),
            _ => panic!("Expected DeletingNode mode"),
        }
        assert!(!editor.session().ui_node(&id("HALL1")).unwrap().selected);
    }

    #[tokio::test]
    async fn test_reselect_while_editing_restores_first_node() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_edit_node();
        editor.select_edit_node(&id("HALL1")).unwrap();
        editor.drag_edit_node(DisplayPoint::new(7.0, 7.0)).unwrap();

        editor.select_edit_node(&id("HALL2")).unwrap();

        let committed = editor.session().project_coords(100, 200);
        let first = editor.session().ui_node(&id("HALL1")).unwrap();
        assert_eq!(first.display, committed);
        assert!(!first.selected);
        match editor.mode() {
            EditorMode::EditingNode { target: Some(target) } => {
                assert_eq!(target.node_id, id("HALL2"));
                assert_eq!(target.long_name, "HALL2 long");
            }
            _ => panic!("Expected EditingNode with target"),
        }
    }

    #[tokio::test]
    async fn test_invalid_position_text_reverts_and_reports() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_edit_node();
        editor.select_edit_node(&id("HALL1")).unwrap();
        let before = editor.session().ui_node(&id("HALL1")).unwrap().display;
        editor.take_events();

        let result = editor.set_edit_position_text("12a", "40");
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(editor.mode_kind(), EditorModeKind::EditingNode);
        assert_eq!(
            editor.session().ui_node(&id("HALL1")).unwrap().display,
            before
        );

        let events = editor.take_events();
        assert!(events
            .iter()
            .any(|e| e.event_type() == "editor.edit_rejected"));
        assert!(events
            .iter()
            .any(|e| e.event_type() == "editor.node_projected"));
    }

    #[tokio::test]
    async fn test_edit_confirm_writes_through() {
        let (mut editor, repo) = create_test_editor().await;
        editor.begin_edit_node();
        editor.select_edit_node(&id("HALL1")).unwrap();
        let display = editor.session().project_coords(110, 220);
        editor.drag_edit_node(display).unwrap();
        editor.set_edit_names("Hall One", "H1").unwrap();
        editor.confirm().await.unwrap();

        let (nodes, _) = repo.snapshot();
        let committed = &nodes["HALL1"];
        assert_eq!((committed.x, committed.y), (110, 220));
        assert_eq!(committed.long_name, "Hall One");
        assert_eq!(committed.short_name, "H1");
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_mode_and_draft() {
        let (mut editor, repo) = create_test_editor().await;
        editor.double_click(DisplayPoint::new(10.0, 10.0));
        editor.set_draft_details("DEPT", "Radiology", "Rad").unwrap();

        repo.fail_writes.store(true, Ordering::SeqCst);
        let result = editor.confirm().await;
        assert!(matches!(result, Err(CoreError::Persistence(_))));
        assert_eq!(editor.mode_kind(), EditorModeKind::AddingNode);

        // The store comes back and the same confirm succeeds
        repo.fail_writes.store(false, Ordering::SeqCst);
        editor.confirm().await.unwrap();
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
        assert_eq!(repo.snapshot().0.len(), 4);
    }

    #[tokio::test]
    async fn test_add_edge_flow() {
        let (mut editor, repo) = create_test_editor().await;
        editor.begin_add_edge();
        editor.pick_edge_endpoint(&id("HALL1")).unwrap();
        editor.pick_edge_endpoint(&id("DEPT1")).unwrap();
        editor.confirm().await.unwrap();

        let expected = Edge::new(id("HALL1"), id("DEPT1"));
        assert!(repo.snapshot().1.contains(&expected));
        assert!(editor
            .session()
            .ui_edges()
            .iter()
            .any(|e| e.edge == expected));
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
    }

    #[tokio::test]
    async fn test_add_edge_rejects_duplicate_pick() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_add_edge();
        editor.pick_edge_endpoint(&id("HALL1")).unwrap();

        let result = editor.pick_edge_endpoint(&id("HALL1"));
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(editor.mode_kind(), EditorModeKind::AddingEdge);
    }

    #[tokio::test]
    async fn test_add_edge_confirm_needs_both_endpoints() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_add_edge();
        editor.pick_edge_endpoint(&id("HALL1")).unwrap();

        let result = editor.confirm().await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(editor.mode_kind(), EditorModeKind::AddingEdge);
    }

    #[tokio::test]
    async fn test_delete_edge_flow() {
        let (mut editor, repo) = create_test_editor().await;
        editor.begin_delete_edge();
        editor
            .toggle_edge_selection(&id("HALL1"), &id("HALL2"))
            .unwrap();
        editor.confirm().await.unwrap();

        assert!(repo.snapshot().1.is_empty());
        assert!(editor.session().ui_edges().is_empty());
        // Both endpoint nodes survive
        assert!(editor.session().contains(&id("HALL1")));
        assert!(editor.session().contains(&id("HALL2")));
    }

    #[tokio::test]
    async fn test_edit_edge_retarget_flow() {
        let (mut editor, repo) = create_test_editor().await;
        editor.begin_edit_edge();
        editor.select_edit_edge(&id("HALL1"), &id("HALL2")).unwrap();
        editor
            .retarget_edge_endpoint(&id("HALL2"), &id("DEPT1"))
            .unwrap();
        editor.confirm().await.unwrap();

        let edges = repo.snapshot().1;
        assert_eq!(edges, vec![Edge::new(id("HALL1"), id("DEPT1"))]);
        assert_eq!(editor.mode_kind(), EditorModeKind::Idle);
    }

    #[tokio::test]
    async fn test_edit_edge_rejects_self_loop() {
        let (mut editor, _) = create_test_editor().await;
        editor.begin_edit_edge();
        editor.select_edit_edge(&id("HALL1"), &id("HALL2")).unwrap();

        let result = editor.retarget_edge_endpoint(&id("HALL2"), &id("HALL1"));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_mode_change_events_are_recorded() {
        let (mut editor, _) = create_test_editor().await;
        editor.take_events();

        editor.double_click(DisplayPoint::new(1.0, 1.0));
        editor.cancel();

        // Two transitions: Idle -> AddingNode -> Idle
        let events = editor.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.event_type() == "editor.mode_changed")
                .count(),
            2
        );
        // Draining leaves the buffer empty
        assert!(editor.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_menu_entry_from_another_mode_discards_first() {
        let (mut editor, repo) = create_test_editor().await;
        let before = repo.snapshot();

        editor.begin_delete_node();
        editor.toggle_delete_selection(&id("HALL1")).unwrap();
        editor.begin_edit_node();

        assert_eq!(editor.mode_kind(), EditorModeKind::EditingNode);
        assert!(!editor.session().ui_node(&id("HALL1")).unwrap().selected);
        assert_eq!(repo.snapshot(), before);
    }

    #[tokio::test]
    async fn test_confirm_in_idle_is_invalid_state() {
        let (mut editor, _) = create_test_editor().await;
        let result = editor.confirm().await;
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_mode_local_action_in_wrong_mode_is_invalid_state() {
        let (mut editor, _) = create_test_editor().await;
        let result = editor.toggle_delete_selection(&id("HALL1"));
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }
}
