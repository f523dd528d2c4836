use thiserror::Error;

/// Core error type for the Wayfinder runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or missing user input; recoverable in place
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced node, request, or employee id is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation was attempted in a state that forbids it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The store was unreachable or a constraint was violated
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal consistency failure; fatal to the current operation
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl CoreError {
    /// Whether the error is recoverable in place, leaving the current
    /// editing mode intact, or aborts the in-progress operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::NotFound(_) | CoreError::InvalidState(_)
        )
    }
}

impl From<std::num::ParseFloatError> for CoreError {
    fn from(err: std::num::ParseFloatError) -> Self {
        CoreError::Validation(format!("Invalid input: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                CoreError::Validation("empty long name".to_string()),
                "Validation error: empty long name",
            ),
            (
                CoreError::NotFound("node ZHALL00101".to_string()),
                "Not found: node ZHALL00101",
            ),
            (
                CoreError::InvalidState("request already closed".to_string()),
                "Invalid state: request already closed",
            ),
            (
                CoreError::Persistence("store unreachable".to_string()),
                "Persistence error: store unreachable",
            ),
            (
                CoreError::InvariantViolation("ui node without source".to_string()),
                "Invariant violation: ui node without source",
            ),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_parse_float_error() {
        let parse_error = "12a".parse::<f64>().unwrap_err();
        let error: CoreError = parse_error.into();

        match error {
            CoreError::Validation(msg) => {
                assert!(msg.starts_with("Invalid input"));
            }
            _ => panic!("Expected Validation variant"),
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(CoreError::Validation("x".to_string()).is_recoverable());
        assert!(CoreError::NotFound("x".to_string()).is_recoverable());
        assert!(CoreError::InvalidState("x".to_string()).is_recoverable());
        assert!(!CoreError::Persistence("x".to_string()).is_recoverable());
        assert!(!CoreError::InvariantViolation("x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_clone_and_eq() {
        let original = CoreError::Validation("test".to_string());
        let cloned = original.clone();

        assert_eq!(original, cloned);
        assert_eq!(format!("{:?}", original), format!("{:?}", cloned));
    }
}
