use crate::CoreError;
use serde::{Deserialize, Serialize};

/// Value object: Employee ID
///
/// Unique across every employee role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub i32);

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The capability a staff member provides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeRole {
    /// Interpreter for the contained set of languages
    Translator {
        /// Languages the translator speaks; matched case-sensitively
        languages: Vec<String>,
    },

    /// Laundry service staff
    Laundry,
}

/// A staff member that service requests can be matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier
    pub id: EmployeeId,

    /// Display name
    pub name: String,

    /// Role-specific data
    pub role: EmployeeRole,
}

impl Employee {
    /// Create a translator with the given language set
    pub fn translator(id: EmployeeId, name: String, languages: Vec<String>) -> Self {
        Self {
            id,
            name,
            role: EmployeeRole::Translator { languages },
        }
    }

    /// Create a laundry staff member
    pub fn laundry(id: EmployeeId, name: String) -> Self {
        Self {
            id,
            name,
            role: EmployeeRole::Laundry,
        }
    }

    /// Whether this employee translates the given language (exact,
    /// case-sensitive match)
    pub fn speaks(&self, language: &str) -> bool {
        match &self.role {
            EmployeeRole::Translator { languages } => languages.iter().any(|l| l == language),
            EmployeeRole::Laundry => false,
        }
    }

    /// Add a language to a translator's set
    ///
    /// Duplicates are ignored. Fails for non-translator roles and for
    /// blank language names.
    pub fn add_language(&mut self, language: &str) -> Result<(), CoreError> {
        if language.trim().is_empty() {
            return Err(CoreError::Validation(
                "Language name must not be empty".to_string(),
            ));
        }
        match &mut self.role {
            EmployeeRole::Translator { languages } => {
                if !languages.iter().any(|l| l == language) {
                    languages.push(language.to_string());
                }
                Ok(())
            }
            EmployeeRole::Laundry => Err(CoreError::InvalidState(format!(
                "Employee {} is not a translator",
                self.id
            ))),
        }
    }

    /// Remove a language from a translator's set
    ///
    /// Removing a language that is not present is a no-op, not an error.
    pub fn remove_language(&mut self, language: &str) -> Result<(), CoreError> {
        match &mut self.role {
            EmployeeRole::Translator { languages } => {
                languages.retain(|l| l != language);
                Ok(())
            }
            EmployeeRole::Laundry => Err(CoreError::InvalidState(format!(
                "Employee {} is not a translator",
                self.id
            ))),
        }
    }
}
