//! Repository traits for the Wayfinder core
//!
//! This module defines the store traits the core runtime is written
//! against. External crates implement these traits to provide different
//! persistence mechanisms; the core only requires that each call either
//! completes or fails without partial effect (in particular, deleting a
//! node must never leave an edge referencing it).

use async_trait::async_trait;

use super::employee::{Employee, EmployeeId};
use super::node::{Edge, NewNode, Node, NodeId};
use super::request::{Request, RequestId, RequestKind, Service};
use crate::CoreError;

/// Store for map nodes and their adjacency
#[async_trait]
pub trait MapRepository: Send + Sync {
    /// Add a node, letting the store assign its id
    async fn add_node(&self, fields: NewNode) -> Result<Node, CoreError>;

    /// Insert a node with a caller-supplied id
    ///
    /// Fails with a persistence error if the id is already taken.
    async fn insert_node(&self, node: Node) -> Result<(), CoreError>;

    /// Fetch a node by id
    async fn node(&self, id: &NodeId) -> Result<Option<Node>, CoreError>;

    /// Overwrite a node's editable fields
    ///
    /// Fails with `NotFound` for an unknown id.
    async fn modify_node(
        &self,
        id: &NodeId,
        x: i32,
        y: i32,
        long_name: &str,
        short_name: &str,
    ) -> Result<(), CoreError>;

    /// Delete a node, cascading removal of every incident edge
    async fn delete_node(&self, id: &NodeId) -> Result<(), CoreError>;

    /// All nodes on one (floor, building) pair
    ///
    /// An empty floor is a valid, empty result.
    async fn floor_nodes(&self, floor: i32, building: &str) -> Result<Vec<Node>, CoreError>;

    /// All edges whose endpoints both lie on the given floor, with the
    /// endpoint records resolved
    async fn floor_edges(&self, floor: i32) -> Result<Vec<(Node, Node)>, CoreError>;

    /// Add an edge between two existing nodes
    ///
    /// Fails with `NotFound` if either endpoint is absent and with a
    /// persistence error if the edge already exists.
    async fn add_edge(&self, a: &NodeId, b: &NodeId) -> Result<Edge, CoreError>;

    /// Remove an edge
    async fn remove_edge(&self, a: &NodeId, b: &NodeId) -> Result<(), CoreError>;
}

/// Store for service requests, staff, and the service catalog
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Create an open request, letting the store assign its id
    async fn create_request(
        &self,
        notes: &str,
        node_id: &NodeId,
        kind: RequestKind,
    ) -> Result<Request, CoreError>;

    /// Fetch a request by id
    async fn request(&self, id: RequestId) -> Result<Option<Request>, CoreError>;

    /// All requests regardless of status, in insertion order
    async fn requests(&self) -> Result<Vec<Request>, CoreError>;

    /// All open requests, in insertion order
    async fn open_requests(&self) -> Result<Vec<Request>, CoreError>;

    /// Overwrite an existing request record
    async fn update_request(&self, request: &Request) -> Result<(), CoreError>;

    /// Add a translator, letting the store assign the id
    async fn add_translator(
        &self,
        name: &str,
        languages: Vec<String>,
    ) -> Result<Employee, CoreError>;

    /// Add a laundry staff member, letting the store assign the id
    async fn add_laundry(&self, name: &str) -> Result<Employee, CoreError>;

    /// Fetch an employee by id
    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, CoreError>;

    /// All employees across both roles
    async fn employees(&self) -> Result<Vec<Employee>, CoreError>;

    /// Overwrite an existing employee record
    async fn update_employee(&self, employee: &Employee) -> Result<(), CoreError>;

    /// Remove an employee
    async fn remove_employee(&self, id: EmployeeId) -> Result<(), CoreError>;

    /// The static service catalog
    async fn services(&self) -> Result<Vec<Service>, CoreError>;
}
