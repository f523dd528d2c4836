use async_trait::async_trait;
use chrono::NaiveTime;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use wayfinder_core::{
    CoreError, Edge, Employee, EmployeeId, MapRepository, NewNode, Node, NodeId, Request,
    RequestId, RequestKind, Service, StaffRepository,
};

/// In-memory implementation of the MapRepository
pub struct InMemoryMapRepository {
    nodes: Arc<RwLock<HashMap<String, Node>>>,
    edges: Arc<RwLock<Vec<Edge>>>,
}

impl InMemoryMapRepository {
    /// Create a new in-memory map repository over shared storage
    pub fn new(
        nodes: Arc<RwLock<HashMap<String, Node>>>,
        edges: Arc<RwLock<Vec<Edge>>>,
    ) -> Self {
        Self { nodes, edges }
    }
}

#[async_trait]
impl MapRepository for InMemoryMapRepository {
    async fn add_node(&self, fields: NewNode) -> Result<Node, CoreError> {
        let node = Node {
            id: NodeId(Uuid::new_v4().to_string()),
            x: fields.x,
            y: fields.y,
            floor: fields.floor,
            building: fields.building,
            node_type: fields.node_type,
            long_name: fields.long_name,
            short_name: fields.short_name,
        };

        let mut nodes = self.nodes.write().await;
        nodes.insert(node.id.0.clone(), node.clone());
        debug!(node_id = %node.id, floor = node.floor, "Node added");
        Ok(node)
    }

    async fn insert_node(&self, node: Node) -> Result<(), CoreError> {
        let mut nodes = self.nodes.write().await;
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
        let nodes = self.nodes.read().await;
        Ok(nodes.get(&id.0).cloned())
    }

    async fn modify_node(
        &self,
        id: &NodeId,
        x: i32,
        y: i32,
        long_name: &str,
        short_name: &str,
    ) -> Result<(), CoreError> {
        let mut nodes = self.nodes.write().await;
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
        let mut nodes = self.nodes.write().await;
        if nodes.remove(&id.0).is_none() {
            return Err(CoreError::NotFound(format!("Node {}", id)));
        }

        // Cascade: the edge store must never reference a deleted node.
        let mut edges = self.edges.write().await;
        let before = edges.len();
        edges.retain(|edge| !edge.touches(id));
        debug!(
            node_id = %id,
            cascaded_edges = before - edges.len(),
            "Node deleted"
        );
        Ok(())
    }

    async fn floor_nodes(&self, floor: i32, building: &str) -> Result<Vec<Node>, CoreError> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .values()
            .filter(|n| n.floor == floor && n.building == building)
            .cloned()
            .collect())
    }

    async fn floor_edges(&self, floor: i32) -> Result<Vec<(Node, Node)>, CoreError> {
        let nodes = self.nodes.read().await;
        let edges = self.edges.read().await;
        Ok(edges
            .iter()
            .filter_map(|edge| {
                let a = nodes.get(&edge.a.0)?;
                let b = nodes.get(&edge.b.0)?;
                (a.floor == floor && b.floor == floor).then(|| (a.clone(), b.clone()))
            })
            .collect())
    }

    async fn add_edge(&self, a: &NodeId, b: &NodeId) -> Result<Edge, CoreError> {
        if a == b {
            return Err(CoreError::Persistence(
                "An edge cannot connect a node to itself".to_string(),
            ));
        }
        let nodes = self.nodes.read().await;
        for end in [a, b] {
            if !nodes.contains_key(&end.0) {
                return Err(CoreError::NotFound(format!("Node {}", end)));
            }
        }

        let edge = Edge::new(a.clone(), b.clone());
        let mut edges = self.edges.write().await;
        if edges.contains(&edge) {
            return Err(CoreError::Persistence(format!(
                "Edge {}-{} already exists",
                edge.a, edge.b
            )));
        }
        edges.push(edge.clone());
        debug!(a = %edge.a, b = %edge.b, "Edge added");
        Ok(edge)
    }

    async fn remove_edge(&self, a: &NodeId, b: &NodeId) -> Result<(), CoreError> {
        let edge = Edge::new(a.clone(), b.clone());
        let mut edges = self.edges.write().await;
        let before = edges.len();
        edges.retain(|e| e != &edge);
        if edges.len() == before {
            return Err(CoreError::NotFound(format!("Edge {}-{}", edge.a, edge.b)));
        }
        Ok(())
    }
}

/// In-memory implementation of the StaffRepository
///
/// Request and employee ids are sequential integers; the service catalog
/// is fixed at construction.
pub struct InMemoryStaffRepository {
    requests: Arc<RwLock<BTreeMap<i32, Request>>>,
    employees: Arc<RwLock<BTreeMap<i32, Employee>>>,
    next_request_id: AtomicI32,
    next_employee_id: AtomicI32,
    services: Vec<Service>,
}

impl InMemoryStaffRepository {
    /// Create a new in-memory staff repository over shared storage
    pub fn new(
        requests: Arc<RwLock<BTreeMap<i32, Request>>>,
        employees: Arc<RwLock<BTreeMap<i32, Employee>>>,
    ) -> Self {
        Self {
            requests,
            employees,
            next_request_id: AtomicI32::new(0),
            next_employee_id: AtomicI32::new(0),
            services: service_catalog(),
        }
    }
}

#[async_trait]
impl StaffRepository for InMemoryStaffRepository {
    async fn create_request(
        &self,
        notes: &str,
        node_id: &NodeId,
        kind: RequestKind,
    ) -> Result<Request, CoreError> {
        let id = RequestId(self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1);
        let request = Request::new(id, notes.to_string(), node_id.clone(), kind);
        let mut requests = self.requests.write().await;
        requests.insert(id.0, request.clone());
        debug!(request_id = %id, node_id = %node_id, "Request created");
        Ok(request)
    }

    async fn request(&self, id: RequestId) -> Result<Option<Request>, CoreError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).cloned())
    }

    async fn requests(&self) -> Result<Vec<Request>, CoreError> {
        let requests = self.requests.read().await;
        Ok(requests.values().cloned().collect())
    }

    async fn open_requests(&self) -> Result<Vec<Request>, CoreError> {
        let requests = self.requests.read().await;
        Ok(requests.values().filter(|r| r.is_open()).cloned().collect())
    }

    async fn update_request(&self, request: &Request) -> Result<(), CoreError> {
        let mut requests = self.requests.write().await;
        if !requests.contains_key(&request.id.0) {
            return Err(CoreError::NotFound(format!("Request {}", request.id)));
        }
        requests.insert(request.id.0, request.clone());
        Ok(())
    }

    async fn add_translator(
        &self,
        name: &str,
        languages: Vec<String>,
    ) -> Result<Employee, CoreError> {
        let id = EmployeeId(self.next_employee_id.fetch_add(1, Ordering::SeqCst) + 1);
        let employee = Employee::translator(id, name.to_string(), languages);
        let mut employees = self.employees.write().await;
        employees.insert(id.0, employee.clone());
        debug!(employee_id = %id, "Translator added");
        Ok(employee)
    }

    async fn add_laundry(&self, name: &str) -> Result<Employee, CoreError> {
        let id = EmployeeId(self.next_employee_id.fetch_add(1, Ordering::SeqCst) + 1);
        let employee = Employee::laundry(id, name.to_string());
        let mut employees = self.employees.write().await;
        employees.insert(id.0, employee.clone());
        debug!(employee_id = %id, "Laundry staff added");
        Ok(employee)
    }

    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, CoreError> {
        let employees = self.employees.read().await;
        Ok(employees.get(&id.0).cloned())
    }

    async fn employees(&self) -> Result<Vec<Employee>, CoreError> {
        let employees = self.employees.read().await;
        Ok(employees.values().cloned().collect())
    }

    async fn update_employee(&self, employee: &Employee) -> Result<(), CoreError> {
        let mut employees = self.employees.write().await;
        if !employees.contains_key(&employee.id.0) {
            return Err(CoreError::NotFound(format!("Employee {}", employee.id)));
        }
        employees.insert(employee.id.0, employee.clone());
        Ok(())
    }

    async fn remove_employee(&self, id: EmployeeId) -> Result<(), CoreError> {
        let mut employees = self.employees.write().await;
        if employees.remove(&id.0).is_none() {
            return Err(CoreError::NotFound(format!("Employee {}", id)));
        }
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Service>, CoreError> {
        Ok(self.services.clone())
    }
}

fn service_catalog() -> Vec<Service> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default();
    vec![
        Service {
            start_time: midnight,
            end_time: midnight,
            service_type: "Translator".to_string(),
            description: "Make a request for our translation services!".to_string(),
        },
        Service {
            start_time: midnight,
            end_time: midnight,
            service_type: "Laundry".to_string(),
            description: "Make a request for laundry services!".to_string(),
        },
    ]
}
