//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::WorkflowError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Offending field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            field: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Problem::new(StatusCode::BAD_REQUEST, "Bad Request").with_detail(detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: WorkflowError) -> Problem {
    match error {
        WorkflowError::Validation { field, message } => {
            Problem::new(StatusCode::BAD_REQUEST, "Validation Error")
                .with_detail(format!("{}: {}", field, message))
                .with_field(field)
        }

        WorkflowError::InvalidTransition { from, to, role } => {
            Problem::new(StatusCode::CONFLICT, "Invalid Transition").with_detail(format!(
                "Role '{}' cannot move a document from '{}' to '{}'",
                role, from, to
            ))
        }

        WorkflowError::NotFound { resource, id } => Problem::new(
            StatusCode::NOT_FOUND,
            format!("{} Not Found", resource),
        )
        .with_detail(format!("{} with id '{}' was not found", resource, id)),

        WorkflowError::Unauthorized { reason } => {
            Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized").with_detail(reason)
        }

        WorkflowError::Forbidden { role, action } => Problem::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
        )
        .with_detail(format!("Role '{}' is not allowed to {}", role, action)),

        WorkflowError::Conflict { reason } => {
            Problem::new(StatusCode::CONFLICT, "Conflict").with_detail(reason)
        }

        WorkflowError::Internal => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        )
        .with_detail("An unexpected error occurred"),
    }
}

impl From<WorkflowError> for Problem {
    fn from(error: WorkflowError) -> Self {
        map_domain_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DocumentStatus, Role};

    #[test]
    fn test_status_codes() {
        let cases = [
            (WorkflowError::validation("next_revision_date", "too early"), 400),
            (WorkflowError::Unauthorized { reason: "expired".into() }, 401),
            (WorkflowError::forbidden(Role::Reviewer, "push live"), 403),
            (WorkflowError::document_not_found("x"), 404),
            (
                WorkflowError::InvalidTransition {
                    from: DocumentStatus::Draft,
                    to: DocumentStatus::Live,
                    role: Role::Admin,
                },
                409,
            ),
            (WorkflowError::Conflict { reason: "busy".into() }, 409),
            (WorkflowError::Internal, 500),
        ];
        for (error, status) in cases {
            assert_eq!(map_domain_error(error).status, status);
        }
    }

    #[test]
    fn test_validation_names_the_field() {
        let problem = map_domain_error(WorkflowError::validation("next_revision_date", "too early"));
        assert_eq!(problem.field.as_deref(), Some("next_revision_date"));
        assert!(problem.detail.unwrap().contains("next_revision_date"));
    }
}
