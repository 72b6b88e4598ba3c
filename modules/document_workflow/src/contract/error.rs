//! Contract error types for the document workflow
//!
//! These errors are transport-agnostic and used for inter-module communication.

use super::model::{DocumentStatus, Role};

/// Document workflow domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Field-level validation failure; nothing was applied
    #[error("Validation error on '{field}': {message}")]
    Validation {
        /// Offending field name
        field: String,
        /// Validation error message
        message: String,
    },

    /// Target status is not reachable from the current one
    #[error("Invalid transition from '{from}' to '{to}' for role '{role}'")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
        role: Role,
    },

    /// Document or change request not found
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (document, change_request)
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Role lacks the capability, or the actor is not assigned to the document
    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden { role: Role, action: String },

    /// Request conflicts with the current state of another record
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Internal error
    #[error("Internal error")]
    Internal,
}

impl WorkflowError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(role: Role, action: impl Into<String>) -> Self {
        Self::Forbidden {
            role,
            action: action.into(),
        }
    }

    pub fn document_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "document".to_string(),
            id: id.to_string(),
        }
    }

    pub fn change_request_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "change_request".to_string(),
            id: id.to_string(),
        }
    }
}
