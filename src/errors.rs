use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// Machine-readable error body used by the CLI's `--json` output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable snake_case error code (e.g. "insufficient_stock")
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error was rendered
    pub timestamp: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(error: &ServiceError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ErrorResponse {
    /// Renders a command failure, using the innermost domain error in the
    /// context chain when there is one.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        if let Some(service_error) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ServiceError>())
        {
            return Self::from(service_error);
        }
        let code = if error
            .chain()
            .any(|cause| cause.downcast_ref::<StorageError>().is_some())
        {
            "storage_error"
        } else {
            "internal_error"
        };
        Self {
            code: code.to_string(),
            message: format!("{:#}", error),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(
        "Insufficient stock for product {product_id} at showroom {showroom_id}: \
         available={available}, requested={requested}"
    )]
    InsufficientStock {
        product_id: String,
        showroom_id: String,
        available: u32,
        requested: u32,
    },

    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::ValidationError(_) => "validation_error",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::StorageError(_) => "storage_error",
            ServiceError::SerializationError(_) => "serialization_error",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::InternalError(_) | ServiceError::Other(_) => "internal_error",
        }
    }

    /// Business-rule and input failures, as opposed to infrastructure faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ServiceError::StorageError(_)
                | ServiceError::SerializationError(_)
                | ServiceError::InternalError(_)
                | ServiceError::Other(_)
        )
    }
}
