use crate::config::{ProjectionScale, SessionConfig};
use crate::domain::node::{DisplayPoint, Edge, Node, NodeId};
use crate::domain::repository::MapRepository;
use crate::CoreError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Editable projection of one persisted node for the lifetime of a floor
/// view
///
/// Owned exclusively by the [`GraphSession`]; discarded when the floor is
/// unloaded or the node is deleted. The `node_id` back-reference replaces
/// the lookup table the session resolves it through.
#[derive(Debug, Clone, PartialEq)]
pub struct UiNode {
    /// Id of the persisted record this projection mirrors
    pub node_id: NodeId,

    /// Current display position; may differ from the committed position
    /// while an edit is in progress
    pub display: DisplayPoint,

    /// Whether the node is part of the active selection
    pub selected: bool,
}

/// Display-space projection of one persisted edge
#[derive(Debug, Clone, PartialEq)]
pub struct UiEdge {
    /// The persisted adjacency this projection mirrors
    pub edge: Edge,

    /// Display position of the `edge.a` endpoint
    pub a_display: DisplayPoint,

    /// Display position of the `edge.b` endpoint
    pub b_display: DisplayPoint,
}

/// In-memory editable view of the nodes and edges on one
/// (floor, building) pair
///
/// All editing-mode mutations go through the session; nothing here writes
/// to the store. The editor commits through the store on confirm and then
/// applies the committed change back into the projection via the
/// `apply_*` methods, keeping the two sides consistent.
pub struct GraphSession {
    map_repo: Arc<dyn MapRepository>,
    scale: ProjectionScale,
    floor: i32,
    building: String,
    sources: HashMap<NodeId, Node>,
    ui_nodes: HashMap<NodeId, UiNode>,
    ui_edges: Vec<UiEdge>,
}

impl GraphSession {
    /// Create an empty session for the configured default floor
    pub fn new(map_repo: Arc<dyn MapRepository>, config: &SessionConfig) -> Self {
        Self {
            map_repo,
            scale: config.scale,
            floor: config.default_floor,
            building: config.default_building.clone(),
            sources: HashMap::new(),
            ui_nodes: HashMap::new(),
            ui_edges: Vec::new(),
        }
    }

    /// The currently loaded floor
    pub fn floor(&self) -> i32 {
        self.floor
    }

    /// The currently loaded building
    pub fn building(&self) -> &str {
        &self.building
    }

    /// Replace the projection with the given (floor, building) pair
    ///
    /// A floor with no nodes is a valid, empty projection, not an error.
    pub async fn load_floor(&mut self, floor: i32, building: &str) -> Result<(), CoreError> {
        let nodes = self.map_repo.floor_nodes(floor, building).await?;
        let edges = self.map_repo.floor_edges(floor).await?;

        self.floor = floor;
        self.building = building.to_string();
        self.sources.clear();
        self.ui_nodes.clear();
        self.ui_edges.clear();

        for node in nodes {
            let display = self.project(&node);
            self.ui_nodes.insert(
                node.id.clone(),
                UiNode {
                    node_id: node.id.clone(),
                    display,
                    selected: false,
                },
            );
            self.sources.insert(node.id.clone(), node);
        }

        // Edges spanning into another building's node set are not part of
        // this projection.
        for (a, b) in edges {
            if self.sources.contains_key(&a.id) && self.sources.contains_key(&b.id) {
                let ui_edge = UiEdge {
                    edge: Edge::new(a.id.clone(), b.id.clone()),
                    a_display: self.project(&a),
                    b_display: self.project(&b),
                };
                self.ui_edges.push(ui_edge);
            }
        }

        info!(
            floor = floor,
            building = %self.building,
            nodes = self.ui_nodes.len(),
            edges = self.ui_edges.len(),
            "Floor projection loaded"
        );

        Ok(())
    }

    /// Project a stored node into display space
    pub fn project(&self, node: &Node) -> DisplayPoint {
        self.project_coords(node.x, node.y)
    }

    /// Project stored coordinates into display space
    pub fn project_coords(&self, x: i32, y: i32) -> DisplayPoint {
        DisplayPoint::new(
            f64::from(x) * self.scale.horizontal,
            f64::from(y) * self.scale.vertical,
        )
    }

    /// Map a display-space point back to integral store coordinates,
    /// rounding to the nearest integer
    pub fn unproject(&self, point: DisplayPoint) -> (i32, i32) {
        (
            (point.x / self.scale.horizontal).round() as i32,
            (point.y / self.scale.vertical).round() as i32,
        )
    }

    /// The projection of one node, if it is on the loaded floor
    pub fn ui_node(&self, id: &NodeId) -> Option<&UiNode> {
        self.ui_nodes.get(id)
    }

    /// All node projections on the loaded floor
    pub fn ui_nodes(&self) -> impl Iterator<Item = &UiNode> {
        self.ui_nodes.values()
    }

    /// All edge projections on the loaded floor
    pub fn ui_edges(&self) -> &[UiEdge] {
        &self.ui_edges
    }

    /// Whether the loaded floor contains the node
    pub fn contains(&self, id: &NodeId) -> bool {
        self.ui_nodes.contains_key(id)
    }

    /// The persisted record backing a projection
    ///
    /// A projection without a backing record means the session and the
    /// store have diverged; that is an invariant violation, not a
    /// recoverable miss.
    pub fn lookup_source(&self, id: &NodeId) -> Result<&Node, CoreError> {
        if !self.ui_nodes.contains_key(id) {
            return Err(CoreError::NotFound(format!(
                "Node {} is not on the loaded floor",
                id
            )));
        }
        match self.sources.get(id) {
            Some(node) => Ok(node),
            None => {
                error!(node_id = %id, "UI node has no backing store record");
                Err(CoreError::InvariantViolation(format!(
                    "UI node {} has no backing store record",
                    id
                )))
            }
        }
    }

    /// Move a node's display position, carrying the endpoints of every
    /// touching edge along with it
    ///
    /// Purely local; the store is not written until confirm.
    pub fn move_node(&mut self, id: &NodeId, display: DisplayPoint) -> Result<(), CoreError> {
        let ui_node = self
            .ui_nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("Node {} is not on the loaded floor", id)))?;
        ui_node.display = display;
        self.sync_edges_for(id);
        Ok(())
    }

    /// Set or clear a node's selection flag
    pub fn set_selected(&mut self, id: &NodeId, selected: bool) -> Result<(), CoreError> {
        let ui_node = self
            .ui_nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("Node {} is not on the loaded floor", id)))?;
        ui_node.selected = selected;
        Ok(())
    }

    /// Clear every selection flag
    pub fn clear_selection(&mut self) {
        for ui_node in self.ui_nodes.values_mut() {
            ui_node.selected = false;
        }
    }

    /// Reset a node's display position to its committed store coordinates
    /// and clear its selection flag
    pub fn restore_node(&mut self, id: &NodeId) -> Result<DisplayPoint, CoreError> {
        let display = {
            let source = self.lookup_source(id)?;
            self.project(source)
        };
        let ui_node = self
            .ui_nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("Node {} is not on the loaded floor", id)))?;
        ui_node.display = display;
        ui_node.selected = false;
        self.sync_edges_for(id);
        Ok(display)
    }

    /// Mirror a node the store just added into the projection
    pub fn apply_added(&mut self, node: Node) -> DisplayPoint {
        let display = self.project(&node);
        self.ui_nodes.insert(
            node.id.clone(),
            UiNode {
                node_id: node.id.clone(),
                display,
                selected: false,
            },
        );
        self.sources.insert(node.id.clone(), node);
        display
    }

    /// Mirror a node the store just deleted out of the projection,
    /// cascading removal of its edge projections
    pub fn apply_removed(&mut self, id: &NodeId) {
        self.ui_nodes.remove(id);
        self.sources.remove(id);
        self.ui_edges.retain(|ui_edge| !ui_edge.edge.touches(id));
        debug!(node_id = %id, "Node removed from projection");
    }

    /// Mirror a committed field edit into the projection
    pub fn apply_modified(
        &mut self,
        id: &NodeId,
        x: i32,
        y: i32,
        long_name: &str,
        short_name: &str,
    ) -> Result<DisplayPoint, CoreError> {
        let source = self.sources.get_mut(id).ok_or_else(|| {
            CoreError::NotFound(format!("Node {} is not on the loaded floor", id))
        })?;
        source.x = x;
        source.y = y;
        source.long_name = long_name.to_string();
        source.short_name = short_name.to_string();

        self.restore_node(id)
    }

    /// Mirror an edge the store just added into the projection
    pub fn apply_edge_added(&mut self, edge: Edge) -> Result<(), CoreError> {
        let a_display = self
            .ui_nodes
            .get(&edge.a)
            .map(|n| n.display)
            .ok_or_else(|| {
                error!(node_id = %edge.a, "Committed edge endpoint missing from projection");
                CoreError::InvariantViolation(format!(
                    "Edge endpoint {} missing from projection",
                    edge.a
                ))
            })?;
        let b_display = self
            .ui_nodes
            .get(&edge.b)
            .map(|n| n.display)
            .ok_or_else(|| {
                error!(node_id = %edge.b, "Committed edge endpoint missing from projection");
                CoreError::InvariantViolation(format!(
                    "Edge endpoint {} missing from projection",
                    edge.b
                ))
            })?;

        self.ui_edges.push(UiEdge {
            edge,
            a_display,
            b_display,
        });
        Ok(())
    }

    /// Mirror an edge the store just removed out of the projection
    pub fn apply_edge_removed(&mut self, edge: &Edge) {
        self.ui_edges.retain(|ui_edge| ui_edge.edge != *edge);
    }

    fn sync_edges_for(&mut self, id: &NodeId) {
        let display = match self.ui_nodes.get(id) {
            Some(ui_node) => ui_node.display,
            None => return,
        };
        for ui_edge in &mut self.ui_edges {
            if ui_edge.edge.a == *id {
                ui_edge.a_display = display;
            } else if ui_edge.edge.b == *id {
                ui_edge.b_display = display;
            }
        }
    }
}
