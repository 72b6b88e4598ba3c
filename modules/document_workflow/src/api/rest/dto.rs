//! REST DTOs with serde derives for HTTP API
//!
//! Field names are camelCase on the wire. Enumerations travel as strings and
//! are parsed in the mapper, so older status spellings are still accepted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Shared DTOs =====

/// Reference to a person in the external user directory
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonDto {
    #[serde(default)]
    #[schema(example = "u-42")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
}

/// Structured audit entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventDto {
    #[schema(example = "approved")]
    pub kind: String,
    pub actor_role: String,
    pub actor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_with: Option<String>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

// ===== Document DTOs =====

/// Document response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: Uuid,
    #[schema(example = "Expense Reimbursement")]
    pub sop_name: String,
    #[schema(example = "SDG-FIN-SOP-01-EN")]
    pub document_code: String,
    pub document_number: Option<String>,
    #[schema(example = "1.0")]
    pub version_number: String,
    #[schema(example = "SOP")]
    pub document_type: String,
    pub department: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,

    #[schema(example = "under-review")]
    pub status: String,
    #[schema(example = "Document Requester")]
    pub pending_with: Option<String>,
    /// Revision date passed while the document is still in review
    pub is_breached: bool,

    pub upload_date: Option<NaiveDate>,
    pub last_revision_date: Option<NaiveDate>,
    pub next_revision_date: Option<NaiveDate>,
    pub review_start_date: Option<NaiveDate>,
    pub review_deadline: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub created_by: Option<String>,
    pub requester: Option<PersonDto>,
    pub document_owners: Vec<PersonDto>,
    pub reviewers: Vec<PersonDto>,
    pub document_creators: Vec<PersonDto>,
    pub compliance_contacts: Vec<PersonDto>,
    pub current_reviewers: Vec<PersonDto>,

    pub comments: Vec<String>,
    pub audit_trail: Vec<AuditEventDto>,

    pub attachment_name: Option<String>,
    pub file_url: Option<String>,
}

/// Create document request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[schema(example = "Expense Reimbursement")]
    pub sop_name: String,
    #[schema(example = "SOP")]
    pub document_type: String,
    #[schema(example = "Finance")]
    pub department: String,
    #[serde(default)]
    #[schema(example = "EN")]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub version_number: Option<String>,
    #[serde(default)]
    pub upload_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_revision_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_revision_date: Option<NaiveDate>,
    #[serde(default)]
    pub review_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub review_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub requester: Option<PersonDto>,
    #[serde(default)]
    pub document_owners: Vec<PersonDto>,
    #[serde(default)]
    pub reviewers: Vec<PersonDto>,
    #[serde(default)]
    pub document_creators: Vec<PersonDto>,
    #[serde(default)]
    pub compliance_contacts: Vec<PersonDto>,
    #[serde(default)]
    pub attachment_name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Partial document update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDocumentRequest {
    pub sop_name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub document_number: Option<String>,
    pub last_revision_date: Option<NaiveDate>,
    pub next_revision_date: Option<NaiveDate>,
    pub review_start_date: Option<NaiveDate>,
    pub review_deadline: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub document_owners: Option<Vec<PersonDto>>,
    pub reviewers: Option<Vec<PersonDto>>,
    pub document_creators: Option<Vec<PersonDto>>,
    pub compliance_contacts: Option<Vec<PersonDto>>,
    /// Requested status; a live document always moves to `live-cr`
    pub status: Option<String>,
    pub comment: Option<String>,
}

/// Query parameters for listing documents
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ListDocumentsQuery {
    pub status: Option<String>,
    pub department: Option<String>,
    pub document_type: Option<String>,
    pub sop_name: Option<String>,
    pub include_deleted: bool,
}

/// Resolved action permissions for the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesDto {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_approve: bool,
    pub can_reject: bool,
    pub can_query: bool,
    pub can_start_review: bool,
    pub can_push_live: bool,
    pub can_upload_revision: bool,
    pub can_take_action: bool,
    pub can_complete_change: bool,
    pub can_archive: bool,
    pub can_delete: bool,
}

// ===== Action DTOs =====

/// Body for actions that only carry an optional note
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RejectRequest {
    #[schema(example = "Section 4 contradicts the travel policy")]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryRequest {
    #[schema(example = "Which approval limit applies?")]
    pub query: String,
}

/// Body for archive and delete
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RetireRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TakeActionRequest {
    /// Party label to forward to; derived from the last query when absent
    #[serde(default)]
    #[schema(example = "Document Requester")]
    pub forward_to: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransitionRequest {
    #[schema(example = "archived")]
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Query parameters for upload-revision; the request body is the file
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadRevisionQuery {
    pub file_name: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentQuery {
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextCodeQuery {
    pub department: String,
    pub document_type: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextCodeDto {
    #[schema(example = "SDG-FIN-SOP-04-EN")]
    pub document_code: String,
}

// ===== Change Request DTOs =====

/// Change request response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestDto {
    pub id: Uuid,
    pub document_id: Option<Uuid>,
    pub document_name: String,
    #[schema(example = "change-request")]
    pub request_type: String,
    #[schema(example = "minor")]
    pub change_type: Option<String>,
    #[schema(example = "pending-owner-approval")]
    pub status: String,
    pub requestor: PersonDto,
    pub approvers: Vec<PersonDto>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub document_type: Option<String>,
    pub language: Option<String>,
    #[schema(example = "1.1")]
    pub proposed_version: String,
    pub comments: Vec<String>,
    pub audit_trail: Vec<AuditEventDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create change request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChangeRequestRequest {
    #[schema(example = "change-request")]
    pub request_type: String,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub approvers: Vec<PersonDto>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ListChangeRequestsQuery {
    pub status: Option<String>,
    pub document_id: Option<Uuid>,
}

/// Body for change-request reject, query and cancel
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReasonRequest {
    pub reason: String,
}

// ===== Health =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    #[schema(example = "ok")]
    pub status: String,
}
