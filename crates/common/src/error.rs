//! Error types for testtool

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using testtool Error
pub type Result<T> = std::result::Result<T, Error>;

/// testtool error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Duplicate module id: {id}")]
    DuplicateModule { id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ValidationErrors> for Error {
    fn from(e: ValidationErrors) -> Self {
        Error::Validation(e)
    }
}

/// One failing field reported by the schema validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Instance path of the failing property (`name`, `address/zip`),
    /// or the literal `field` when no path could be resolved.
    pub field: String,
    pub message: String,
}

/// Ordered list of field errors produced by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Errors attached to a top-level field (its own path or any nested one)
    pub fn for_field<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| {
            e.field == name
                || e.field
                    .strip_prefix(name)
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    /// Whether any error names the given field
    pub fn names(&self, name: &str) -> bool {
        self.for_field(name).next().is_some()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_field_matches_nested_paths() {
        let errors = ValidationErrors(vec![
            FieldError { field: "address/zip".into(), message: "too short".into() },
            FieldError { field: "addressLine".into(), message: "missing".into() },
        ]);

        assert_eq!(errors.for_field("address").count(), 1);
        assert!(errors.names("addressLine"));
        assert!(!errors.names("zip"));
    }

    #[test]
    fn test_display_joins_pairs() {
        let errors = ValidationErrors(vec![
            FieldError { field: "name".into(), message: "required".into() },
            FieldError { field: "age".into(), message: "must be integer".into() },
        ]);
        assert_eq!(errors.to_string(), "name: required; age: must be integer");
    }
}
