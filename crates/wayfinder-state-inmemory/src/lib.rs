//! In-memory state store implementation for the Wayfinder tool
//!
//! This crate provides in-memory implementations of the store traits
//! defined in the wayfinder-core crate. It is primarily useful for
//! development, testing, and single-process deployments where persistence
//! is not required.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod repositories;
pub use repositories::{InMemoryMapRepository, InMemoryStaffRepository};

use wayfinder_core::{Edge, Employee, MapRepository, Node, Request, StaffRepository};

/// Provider for in-memory store repositories
pub struct InMemoryStateProvider {
    // Shared storage for map nodes, keyed by id
    nodes: Arc<RwLock<HashMap<String, Node>>>,

    // Shared storage for adjacency pairs
    edges: Arc<RwLock<Vec<Edge>>>,

    // Shared storage for service requests, keyed by id
    requests: Arc<RwLock<BTreeMap<i32, Request>>>,

    // Shared storage for staff records, keyed by id
    employees: Arc<RwLock<BTreeMap<i32, Employee>>>,
}

impl InMemoryStateProvider {
    /// Create a new in-memory state provider
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
            edges: Arc::new(RwLock::new(Vec::new())),
            requests: Arc::new(RwLock::new(BTreeMap::new())),
            employees: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create repositories over this provider's shared storage
    pub fn create_repositories(&self) -> (Arc<dyn MapRepository>, Arc<dyn StaffRepository>) {
        let map_repo = Arc::new(InMemoryMapRepository::new(
            self.nodes.clone(),
            self.edges.clone(),
        ));
        let staff_repo = Arc::new(InMemoryStaffRepository::new(
            self.requests.clone(),
            self.employees.clone(),
        ));
        (map_repo, staff_repo)
    }
}

impl Default for InMemoryStateProvider {
    fn default() -> Self {
        Self::new()
    }
}
