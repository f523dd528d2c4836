use crate::domain::employee::{Employee, EmployeeId};
use crate::domain::node::NodeId;
use crate::domain::repository::{MapRepository, StaffRepository};
use crate::domain::request::{Request, RequestId, RequestKind, Service};
use crate::CoreError;
use std::sync::Arc;
use tracing::info;

/// Service for the request lifecycle and the staff registry
///
/// Independent of the editing mode; node ids are foreign keys into the map
/// store and are validated against it on request creation.
pub struct RequestService {
    /// Store for requests, staff, and the service catalog
    staff_repo: Arc<dyn StaffRepository>,

    /// Store the bound node ids are validated against
    map_repo: Arc<dyn MapRepository>,
}

impl RequestService {
    /// Create a new request service
    pub fn new(staff_repo: Arc<dyn StaffRepository>, map_repo: Arc<dyn MapRepository>) -> Self {
        Self {
            staff_repo,
            map_repo,
        }
    }

    /// Create an open translation request bound to a node
    pub async fn create_translation_request(
        &self,
        notes: &str,
        node_id: &NodeId,
        language: &str,
    ) -> Result<Request, CoreError> {
        if language.trim().is_empty() {
            return Err(CoreError::Validation(
                "A translation request needs a language".to_string(),
            ));
        }
        self.require_node(node_id).await?;

        let request = self
            .staff_repo
            .create_request(
                notes,
                node_id,
                RequestKind::Translation {
                    language: language.to_string(),
                },
            )
            .await?;
        info!(request_id = %request.id, node_id = %node_id, language = language, "Translation request created");
        Ok(request)
    }

    /// Create an open laundry request bound to a node
    pub async fn create_laundry_request(
        &self,
        notes: &str,
        node_id: &NodeId,
    ) -> Result<Request, CoreError> {
        self.require_node(node_id).await?;

        let request = self
            .staff_repo
            .create_request(notes, node_id, RequestKind::Laundry)
            .await?;
        info!(request_id = %request.id, node_id = %node_id, "Laundry request created");
        Ok(request)
    }

    /// Mark a request fulfilled
    ///
    /// Fails with `InvalidState` unless the request is currently open.
    pub async fn complete_request(&self, id: RequestId) -> Result<Request, CoreError> {
        let mut request = self.require_request(id).await?;
        request.complete()?;
        self.staff_repo.update_request(&request).await?;
        info!(request_id = %id, "Request completed");
        Ok(request)
    }

    /// Mark a request declined
    ///
    /// Fails with `InvalidState` unless the request is currently open.
    pub async fn deny_request(&self, id: RequestId) -> Result<Request, CoreError> {
        let mut request = self.require_request(id).await?;
        request.deny()?;
        self.staff_repo.update_request(&request).await?;
        info!(request_id = %id, "Request denied");
        Ok(request)
    }

    /// Fetch one request
    pub async fn request(&self, id: RequestId) -> Result<Request, CoreError> {
        self.require_request(id).await
    }

    /// All requests regardless of status, in insertion order
    pub async fn requests(&self) -> Result<Vec<Request>, CoreError> {
        self.staff_repo.requests().await
    }

    /// All open requests, in insertion order
    pub async fn open_requests(&self) -> Result<Vec<Request>, CoreError> {
        self.staff_repo.open_requests().await
    }

    /// Translators whose language set contains `language`
    /// (case-sensitive exact match)
    pub async fn translators_for_language(
        &self,
        language: &str,
    ) -> Result<Vec<Employee>, CoreError> {
        let employees = self.staff_repo.employees().await?;
        Ok(employees
            .into_iter()
            .filter(|e| e.speaks(language))
            .collect())
    }

    /// Register a translator
    pub async fn add_translator(
        &self,
        name: &str,
        languages: Vec<String>,
    ) -> Result<Employee, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Employee name must not be empty".to_string(),
            ));
        }
        if languages.iter().any(|l| l.trim().is_empty()) {
            return Err(CoreError::Validation(
                "Language name must not be empty".to_string(),
            ));
        }
        let mut deduped: Vec<String> = Vec::with_capacity(languages.len());
        for language in languages {
            if !deduped.contains(&language) {
                deduped.push(language);
            }
        }

        let employee = self.staff_repo.add_translator(name, deduped).await?;
        info!(employee_id = %employee.id, name = name, "Translator registered");
        Ok(employee)
    }

    /// Register a laundry staff member
    pub async fn add_laundry(&self, name: &str) -> Result<Employee, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Employee name must not be empty".to_string(),
            ));
        }

        let employee = self.staff_repo.add_laundry(name).await?;
        info!(employee_id = %employee.id, name = name, "Laundry staff registered");
        Ok(employee)
    }

    /// Fetch one employee
    pub async fn employee(&self, id: EmployeeId) -> Result<Employee, CoreError> {
        self.require_employee(id).await
    }

    /// All employees across both roles
    pub async fn employees(&self) -> Result<Vec<Employee>, CoreError> {
        self.staff_repo.employees().await
    }

    /// Remove an employee from the registry
    pub async fn remove_employee(&self, id: EmployeeId) -> Result<(), CoreError> {
        self.staff_repo.remove_employee(id).await?;
        info!(employee_id = %id, "Employee removed");
        Ok(())
    }

    /// Add a language to a translator's set
    pub async fn add_language(&self, id: EmployeeId, language: &str) -> Result<(), CoreError> {
        let mut employee = self.require_employee(id).await?;
        employee.add_language(language)?;
        self.staff_repo.update_employee(&employee).await
    }

    /// Remove a language from a translator's set
    ///
    /// Removing a language that is not present is a no-op.
    pub async fn remove_language(&self, id: EmployeeId, language: &str) -> Result<(), CoreError> {
        let mut employee = self.require_employee(id).await?;
        employee.remove_language(language)?;
        self.staff_repo.update_employee(&employee).await
    }

    /// The static service catalog
    pub async fn services(&self) -> Result<Vec<Service>, CoreError> {
        self.staff_repo.services().await
    }

    async fn require_node(&self, id: &NodeId) -> Result<(), CoreError> {
        match self.map_repo.node(id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound(format!("Node {}", id))),
        }
    }

    async fn require_request(&self, id: RequestId) -> Result<Request, CoreError> {
        self.staff_repo
            .request(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Request {}", id)))
    }

    async fn require_employee(&self, id: EmployeeId) -> Result<Employee, CoreError> {
        self.staff_repo
            .employee(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Employee {}", id)))
    }
}
