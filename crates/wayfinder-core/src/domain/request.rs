use crate::domain::node::NodeId;
use crate::CoreError;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Value object: Request ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub i32);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Service request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting fulfilment
    Open,

    /// Fulfilled
    Complete,

    /// Declined
    Deny,
}

/// Variant-specific request data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Translation request for the contained language
    Translation {
        /// Language the requester needs
        language: String,
    },

    /// Laundry pickup request
    Laundry,
}

/// Aggregate: a service request bound to a map node
///
/// Transitions Open -> {Complete, Deny} exactly once; a closed request is
/// never reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier
    pub id: RequestId,

    /// Free-text notes from the requester
    pub notes: String,

    /// The map node the request was raised against
    pub node_id: NodeId,

    /// Current status
    pub status: RequestStatus,

    /// Variant-specific data
    pub kind: RequestKind,

    /// When the request was created
    pub time_requested: DateTime<Utc>,

    /// When the request was completed or denied; `None` while open
    pub time_completed: Option<DateTime<Utc>>,
}

impl Request {
    /// Create a new open request
    pub fn new(id: RequestId, notes: String, node_id: NodeId, kind: RequestKind) -> Self {
        Self {
            id,
            notes,
            node_id,
            status: RequestStatus::Open,
            kind,
            time_requested: Utc::now(),
            time_completed: None,
        }
    }

    /// Whether the request is still open
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }

    /// Mark the request fulfilled
    pub fn complete(&mut self) -> Result<(), CoreError> {
        if self.status != RequestStatus::Open {
            return Err(CoreError::InvalidState(format!(
                "Cannot complete request {} in status {:?}",
                self.id, self.status
            )));
        }

        self.status = RequestStatus::Complete;
        self.time_completed = Some(Utc::now());
        Ok(())
    }

    /// Mark the request declined
    pub fn deny(&mut self) -> Result<(), CoreError> {
        if self.status != RequestStatus::Open {
            return Err(CoreError::InvalidState(format!(
                "Cannot deny request {} in status {:?}",
                self.id, self.status
            )));
        }

        self.status = RequestStatus::Deny;
        self.time_completed = Some(Utc::now());
        Ok(())
    }
}

/// Static catalog entry describing a request category
///
/// Read-only reference data; not user-editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// When the service becomes available each day
    pub start_time: NaiveTime,

    /// When the service stops being available each day
    pub end_time: NaiveTime,

    /// Category label, e.g. "Translator"
    pub service_type: String,

    /// Human-readable description shown to requesters
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request() -> Request {
        Request::new(
            RequestId(1),
            "speak".to_string(),
            NodeId("ZHALL00102".to_string()),
            RequestKind::Translation {
                language: "Gnomish".to_string(),
            },
        )
    }

    #[test]
    fn test_new_request_is_open() {
        let request = create_test_request();
        assert_eq!(request.status, RequestStatus::Open);
        assert!(request.is_open());
        assert!(request.time_completed.is_none());
        assert!(request.time_requested <= Utc::now());
    }

    #[test]
    fn test_complete_sets_timestamp_once() {
        let mut request = create_test_request();
        request.complete().unwrap();

        assert_eq!(request.status, RequestStatus::Complete);
        let completed_at = request.time_completed;
        assert!(completed_at.is_some());

        // A second completion is rejected and the timestamp is untouched
        let result = request.complete();
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
        assert_eq!(request.time_completed, completed_at);
    }

    #[test]
    fn test_deny_sets_timestamp_once() {
        let mut request = create_test_request();
        request.deny().unwrap();

        assert_eq!(request.status, RequestStatus::Deny);
        assert!(request.time_completed.is_some());

        let result = request.deny();
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_closed_request_cannot_switch_outcome() {
        let mut request = create_test_request();
        request.complete().unwrap();

        let result = request.deny();
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
        assert_eq!(request.status, RequestStatus::Complete);
    }

    #[test]
    fn test_request_serialization() {
        let request = create_test_request();
        let serialized = serde_json::to_string(&request).unwrap();
        let deserialized: Request = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, request);
    }
}
