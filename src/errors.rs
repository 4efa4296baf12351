use thiserror::Error;

use crate::di::TypeKey;

pub type Result<T> = std::result::Result<T, MockerError>;

/// Errors raised while registering mocks or constructing a type under test
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Ambiguous constructor for {type_name}: {reason}")]
    AmbiguousConstructor { type_name: String, reason: String },

    #[error("No resolvable constructor for {type_name}: {}", .blocked.join("; "))]
    NoResolvableConstructor {
        type_name: String,
        blocked: Vec<String>,
    },

    #[error("Unresolvable parameter '{parameter}' of type {parameter_type} in {type_name}")]
    UnresolvableParameter {
        type_name: String,
        parameter: String,
        parameter_type: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Failed to construct {type_name}: {reason}")]
    ConstructionFailed { type_name: String, reason: String },
}

impl MockerError {
    /// Create a not found error for `T`
    pub fn not_found<T: ?Sized + 'static>() -> Self {
        MockerError::NotFound(std::any::type_name::<T>().to_string())
    }

    pub fn not_found_key(key: &TypeKey) -> Self {
        MockerError::NotFound(key.to_string())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        MockerError::InvalidArgument(reason.into())
    }

    pub fn ambiguous<T: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        MockerError::AmbiguousConstructor {
            type_name: std::any::type_name::<T>().to_string(),
            reason: reason.into(),
        }
    }

    pub fn construction<T: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        MockerError::ConstructionFailed {
            type_name: std::any::type_name::<T>().to_string(),
            reason: reason.into(),
        }
    }
}
