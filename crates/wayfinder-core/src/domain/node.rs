use serde::{Deserialize, Serialize};

/// Value object: Node ID
///
/// Globally unique and immutable once the node is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted map node record
///
/// Coordinates are integral pixel positions in the source map image.
/// `(floor, building)` partitions the map into independently loaded
/// subgraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// X position in source-image space
    pub x: i32,

    /// Y position in source-image space
    pub y: i32,

    /// Floor number
    pub floor: i32,

    /// Building name
    pub building: String,

    /// Free-form category tag, e.g. "HALL" or "DEPT"
    pub node_type: String,

    /// Full descriptive name
    pub long_name: String,

    /// Abbreviated display name
    pub short_name: String,
}

/// Field set for a node the store has not assigned an id to yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNode {
    /// X position in source-image space
    pub x: i32,
    /// Y position in source-image space
    pub y: i32,
    /// Floor number
    pub floor: i32,
    /// Building name
    pub building: String,
    /// Free-form category tag
    pub node_type: String,
    /// Full descriptive name
    pub long_name: String,
    /// Abbreviated display name
    pub short_name: String,
}

/// A point in display space
///
/// Display coordinates are what the presentation layer renders at; they are
/// derived from store coordinates by the session's fixed projection scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    /// Display-space x
    pub x: f64,
    /// Display-space y
    pub y: f64,
}

impl DisplayPoint {
    /// Create a display point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An unordered pair of node ids
///
/// Endpoints are normalized on construction so `Edge::new(a, b)` and
/// `Edge::new(b, a)` are the same edge. Both endpoints must exist in the
/// node store when the edge is created; deleting either endpoint removes
/// the edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Lexicographically smaller endpoint
    pub a: NodeId,

    /// Lexicographically larger endpoint
    pub b: NodeId,
}

impl Edge {
    /// Create an edge, normalizing endpoint order
    pub fn new(first: NodeId, second: NodeId) -> Self {
        if first.0 <= second.0 {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    /// Whether the edge is incident to the given node
    pub fn touches(&self, id: &NodeId) -> bool {
        self.a == *id || self.b == *id
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint
    pub fn other_end(&self, id: &NodeId) -> Option<&NodeId> {
        if self.a == *id {
            Some(&self.b)
        } else if self.b == *id {
            Some(&self.a)
        } else {
            None
        }
    }
}
