//! Contract models for the document workflow
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models. REST DTOs and storage
//! entities have their own representations and mappers.

use chrono::{DateTime, Months, NaiveDate, Utc};
use std::fmt;
use uuid::Uuid;

// ===== Status =====

/// Lifecycle status of a document.
///
/// A single closed set; legacy spellings are folded into it by
/// [`DocumentStatus::from_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Draft,
    UnderReview,
    PendingCreatorApproval,
    PendingRequesterApproval,
    UnderRevision,
    PendingOwnerApproval,
    Approved,
    Live,
    LiveCr,
    Queried,
    Reviewed,
    Archived,
    Deleted,
    Rejected,
    PendingWithRequester,
}

impl DocumentStatus {
    /// Every status, in pipeline order
    pub const ALL: [DocumentStatus; 15] = [
        DocumentStatus::Draft,
        DocumentStatus::UnderReview,
        DocumentStatus::PendingCreatorApproval,
        DocumentStatus::PendingRequesterApproval,
        DocumentStatus::UnderRevision,
        DocumentStatus::PendingOwnerApproval,
        DocumentStatus::Approved,
        DocumentStatus::Live,
        DocumentStatus::LiveCr,
        DocumentStatus::Queried,
        DocumentStatus::Reviewed,
        DocumentStatus::Archived,
        DocumentStatus::Deleted,
        DocumentStatus::Rejected,
        DocumentStatus::PendingWithRequester,
    ];

    /// Canonical kebab-case representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::UnderReview => "under-review",
            DocumentStatus::PendingCreatorApproval => "pending-creator-approval",
            DocumentStatus::PendingRequesterApproval => "pending-requester-approval",
            DocumentStatus::UnderRevision => "under-revision",
            DocumentStatus::PendingOwnerApproval => "pending-owner-approval",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Live => "live",
            DocumentStatus::LiveCr => "live-cr",
            DocumentStatus::Queried => "queried",
            DocumentStatus::Reviewed => "reviewed",
            DocumentStatus::Archived => "archived",
            DocumentStatus::Deleted => "deleted",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::PendingWithRequester => "pending-with-requester",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Roles and parties =====

/// Authorization role carried in the JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    DocumentController,
    DocumentCreator,
    DocumentOwner,
    Reviewer,
    Requester,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::DocumentController,
        Role::DocumentCreator,
        Role::DocumentOwner,
        Role::Reviewer,
        Role::Requester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::DocumentController => "document-controller",
            Role::DocumentCreator => "document-creator",
            Role::DocumentOwner => "document-owner",
            Role::Reviewer => "reviewer",
            Role::Requester => "requester",
        }
    }

    /// Human-readable label used in comments
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::DocumentController => "Document Controller",
            Role::DocumentCreator => "Document Creator",
            Role::DocumentOwner => "Document Owner",
            Role::Reviewer => "Reviewer",
            Role::Requester => "Document Requester",
        }
    }

    /// Parse a role claim, accepting kebab, snake and title-cased spellings
    pub fn parse(value: &str) -> Option<Role> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "admin" => Some(Role::Admin),
            "document-controller" | "controller" => Some(Role::DocumentController),
            "document-creator" | "creator" => Some(Role::DocumentCreator),
            "document-owner" | "owner" => Some(Role::DocumentOwner),
            "reviewer" => Some(Role::Reviewer),
            "requester" | "document-requester" => Some(Role::Requester),
            _ => None,
        }
    }

    /// Party label this role acts as
    pub fn party(&self) -> Party {
        match self {
            Role::Admin | Role::DocumentController => Party::DocumentController,
            Role::DocumentCreator => Party::DocumentCreator,
            Role::DocumentOwner => Party::DocumentOwner,
            Role::Reviewer => Party::Reviewer,
            Role::Requester => Party::DocumentRequester,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party a document is pending with (`pendingWith`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Party {
    DocumentController,
    DocumentOwner,
    DocumentCreator,
    DocumentRequester,
    Reviewer,
    /// Free-text label kept from legacy records
    Other(String),
}

impl Party {
    pub fn label(&self) -> &str {
        match self {
            Party::DocumentController => "Document Controller",
            Party::DocumentOwner => "Document Owner",
            Party::DocumentCreator => "Document Creator",
            Party::DocumentRequester => "Document Requester",
            Party::Reviewer => "Reviewer",
            Party::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Party {
        match label.trim() {
            "Document Controller" => Party::DocumentController,
            "Document Owner" => Party::DocumentOwner,
            "Document Creator" => Party::DocumentCreator,
            "Document Requester" | "Requester" => Party::DocumentRequester,
            "Reviewer" | "Reviewers" => Party::Reviewer,
            other => Party::Other(other.to_string()),
        }
    }

    /// Role that acts when a document is pending with this party
    pub fn role(&self) -> Option<Role> {
        match self {
            Party::DocumentController => Some(Role::DocumentController),
            Party::DocumentOwner => Some(Role::DocumentOwner),
            Party::DocumentCreator => Some(Role::DocumentCreator),
            Party::DocumentRequester => Some(Role::Requester),
            Party::Reviewer => Some(Role::Reviewer),
            Party::Other(_) => None,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Person reference owned by the external user directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// Weak-reference match by user id or (case-insensitive) email
    pub fn matches(&self, user_id: &str, email: Option<&str>) -> bool {
        if !self.id.is_empty() && self.id == user_id {
            return true;
        }
        match email {
            Some(email) if !email.is_empty() => self.email.eq_ignore_ascii_case(email),
            _ => false,
        }
    }
}

/// Identity of the caller, threaded explicitly into every workflow call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: String,
    pub role: Role,
    pub email: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub country: Option<String>,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            email: None,
            name: None,
            department: None,
            country: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Whether this actor is the given person
    pub fn is(&self, person: &Person) -> bool {
        person.matches(&self.user_id, self.email.as_deref())
    }

    /// Person reference for this actor
    pub fn as_person(&self) -> Person {
        Person {
            id: self.user_id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.user_id.clone()),
            email: self.email.clone().unwrap_or_default(),
        }
    }
}

// ===== Document =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Sop,
    Policy,
    Procedure,
    Guideline,
    Manual,
    WorkInstruction,
    Form,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Sop => "SOP",
            DocumentType::Policy => "Policy",
            DocumentType::Procedure => "Procedure",
            DocumentType::Guideline => "Guideline",
            DocumentType::Manual => "Manual",
            DocumentType::WorkInstruction => "Work Instruction",
            DocumentType::Form => "Form",
        }
    }

    pub fn parse(value: &str) -> Option<DocumentType> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "sop" => Some(DocumentType::Sop),
            "policy" => Some(DocumentType::Policy),
            "procedure" => Some(DocumentType::Procedure),
            "guideline" => Some(DocumentType::Guideline),
            "manual" => Some(DocumentType::Manual),
            "work instruction" => Some(DocumentType::WorkInstruction),
            "form" => Some(DocumentType::Form),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Arabic,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Arabic => "AR",
        }
    }

    pub fn parse(value: &str) -> Option<Language> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EN" | "ENGLISH" => Some(Language::English),
            "AR" | "ARABIC" => Some(Language::Arabic),
            _ => None,
        }
    }
}

/// Kind of a structured audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditKind {
    Created,
    Edited,
    ControllerAction,
    Approved,
    Rejected,
    Queried,
    RevisionUploaded,
    PushedLive,
    ReviewStarted,
    ChangeCompleted,
    Archived,
    Deleted,
    StatusChanged,
    FileAttached,
    ChangeRequested,
    ChangeRequestApproved,
    ChangeRequestRejected,
    ChangeRequestQueried,
    ChangeRequestCancelled,
    ChangeRequestCompleted,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Created => "created",
            AuditKind::Edited => "edited",
            AuditKind::ControllerAction => "controller_action",
            AuditKind::Approved => "approved",
            AuditKind::Rejected => "rejected",
            AuditKind::Queried => "queried",
            AuditKind::RevisionUploaded => "revision_uploaded",
            AuditKind::PushedLive => "pushed_live",
            AuditKind::ReviewStarted => "review_started",
            AuditKind::ChangeCompleted => "change_completed",
            AuditKind::Archived => "archived",
            AuditKind::Deleted => "deleted",
            AuditKind::StatusChanged => "status_changed",
            AuditKind::FileAttached => "file_attached",
            AuditKind::ChangeRequested => "change_requested",
            AuditKind::ChangeRequestApproved => "change_request_approved",
            AuditKind::ChangeRequestRejected => "change_request_rejected",
            AuditKind::ChangeRequestQueried => "change_request_queried",
            AuditKind::ChangeRequestCancelled => "change_request_cancelled",
            AuditKind::ChangeRequestCompleted => "change_request_completed",
        }
    }

    pub fn parse(value: &str) -> Option<AuditKind> {
        const KINDS: [AuditKind; 20] = [
            AuditKind::Created,
            AuditKind::Edited,
            AuditKind::ControllerAction,
            AuditKind::Approved,
            AuditKind::Rejected,
            AuditKind::Queried,
            AuditKind::RevisionUploaded,
            AuditKind::PushedLive,
            AuditKind::ReviewStarted,
            AuditKind::ChangeCompleted,
            AuditKind::Archived,
            AuditKind::Deleted,
            AuditKind::StatusChanged,
            AuditKind::FileAttached,
            AuditKind::ChangeRequested,
            AuditKind::ChangeRequestApproved,
            AuditKind::ChangeRequestRejected,
            AuditKind::ChangeRequestQueried,
            AuditKind::ChangeRequestCancelled,
            AuditKind::ChangeRequestCompleted,
        ];
        KINDS.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Structured audit entry kept on documents and change requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub kind: AuditKind,
    pub actor_role: Role,
    pub actor_id: String,
    /// Document status before the action (documents only)
    pub from_status: Option<DocumentStatus>,
    /// Document status after the action (documents only)
    pub to_status: Option<DocumentStatus>,
    pub pending_with: Option<Party>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Compliance document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub sop_name: String,
    pub document_code: String,
    pub document_number: Option<String>,
    pub version_number: String,
    pub document_type: DocumentType,
    pub department: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub language: Option<Language>,

    pub status: DocumentStatus,
    pub pending_with: Option<Party>,

    pub upload_date: Option<NaiveDate>,
    pub last_revision_date: Option<NaiveDate>,
    pub next_revision_date: Option<NaiveDate>,
    pub review_start_date: Option<NaiveDate>,
    pub review_deadline: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// User id of the author
    pub created_by: Option<String>,
    pub requester: Option<Person>,
    pub document_owners: Vec<Person>,
    pub reviewers: Vec<Person>,
    pub document_creators: Vec<Person>,
    pub compliance_contacts: Vec<Person>,
    /// Reviewers of the review round in progress
    pub current_reviewers: Vec<Person>,

    /// Human-readable, append-only
    pub comments: Vec<String>,
    /// Machine-readable, append-only
    pub audit_trail: Vec<AuditEvent>,

    pub attachment_name: Option<String>,
    pub file_url: Option<String>,
}

impl Document {
    /// True when the revision date has passed while the document sits in review
    pub fn is_breached_on(&self, today: NaiveDate) -> bool {
        self.status == DocumentStatus::UnderReview
            && self.next_revision_date.is_some_and(|next| today > next)
    }

    pub fn is_breached(&self) -> bool {
        self.is_breached_on(Utc::now().date_naive())
    }

    /// Every person attached to the document in any capacity
    pub fn stakeholders(&self) -> Vec<Person> {
        let mut people: Vec<Person> = Vec::new();
        let groups = [
            &self.document_owners,
            &self.reviewers,
            &self.document_creators,
            &self.compliance_contacts,
        ];
        for person in groups.into_iter().flatten() {
            if !people.iter().any(|p| p.id == person.id && p.email == person.email) {
                people.push(person.clone());
            }
        }
        people
    }

    /// Party that raised the most recent query, read from the audit trail
    pub fn last_query_origin(&self) -> Option<Role> {
        self.audit_trail
            .iter()
            .rev()
            .find(|event| event.kind == AuditKind::Queried)
            .map(|event| event.actor_role)
    }
}

/// Input for creating a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub sop_name: String,
    pub document_type: DocumentType,
    pub department: String,
    pub language: Option<Language>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub document_number: Option<String>,
    /// Defaults to "1.0"
    pub version_number: Option<String>,
    pub upload_date: Option<NaiveDate>,
    pub last_revision_date: Option<NaiveDate>,
    /// Filled from `last_revision_date` when absent
    pub next_revision_date: Option<NaiveDate>,
    pub review_start_date: Option<NaiveDate>,
    pub review_deadline: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub requester: Option<Person>,
    pub document_owners: Vec<Person>,
    pub reviewers: Vec<Person>,
    pub document_creators: Vec<Person>,
    pub compliance_contacts: Vec<Person>,
    pub attachment_name: Option<String>,
    pub file_url: Option<String>,
    pub comment: Option<String>,
}

impl NewDocument {
    pub fn new(
        sop_name: impl Into<String>,
        document_type: DocumentType,
        department: impl Into<String>,
    ) -> Self {
        Self {
            sop_name: sop_name.into(),
            document_type,
            department: department.into(),
            language: None,
            country: None,
            description: None,
            document_number: None,
            version_number: None,
            upload_date: None,
            last_revision_date: None,
            next_revision_date: None,
            review_start_date: None,
            review_deadline: None,
            effective_date: None,
            requester: None,
            document_owners: Vec::new(),
            reviewers: Vec::new(),
            document_creators: Vec::new(),
            compliance_contacts: Vec::new(),
            attachment_name: None,
            file_url: None,
            comment: None,
        }
    }
}

/// Partial update of a document's descriptive fields.
///
/// `status` is the nominally requested target; on a live document it is
/// overridden to `live-cr`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub sop_name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub document_number: Option<String>,
    pub last_revision_date: Option<NaiveDate>,
    pub next_revision_date: Option<NaiveDate>,
    pub review_start_date: Option<NaiveDate>,
    pub review_deadline: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub document_owners: Option<Vec<Person>>,
    pub reviewers: Option<Vec<Person>>,
    pub document_creators: Option<Vec<Person>>,
    pub compliance_contacts: Option<Vec<Person>>,
    pub status: Option<DocumentStatus>,
    pub comment: Option<String>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        *self == DocumentPatch::default()
    }
}

/// File payload handed to the file store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Filter for listing documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub department: Option<String>,
    pub document_type: Option<DocumentType>,
    pub sop_name: Option<String>,
    pub include_deleted: bool,
}

/// Action permissions resolved for a `(status, role)` pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
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

// ===== Change requests =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    NewRequest,
    ChangeRequest,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::NewRequest => "new-request",
            RequestType::ChangeRequest => "change-request",
        }
    }

    pub fn parse(value: &str) -> Option<RequestType> {
        match value.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "new-request" | "new" => Some(RequestType::NewRequest),
            "change-request" | "change" => Some(RequestType::ChangeRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Major,
    Minor,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Major => "major",
            ChangeType::Minor => "minor",
        }
    }

    pub fn parse(value: &str) -> Option<ChangeType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "major" => Some(ChangeType::Major),
            "minor" => Some(ChangeType::Minor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    PendingOwnerApproval,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "pending",
            ChangeRequestStatus::Approved => "approved",
            ChangeRequestStatus::Rejected => "rejected",
            ChangeRequestStatus::Completed => "completed",
            ChangeRequestStatus::PendingOwnerApproval => "pending-owner-approval",
        }
    }

    pub fn parse(value: &str) -> Option<ChangeRequestStatus> {
        match value.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "pending" => Some(ChangeRequestStatus::Pending),
            "approved" => Some(ChangeRequestStatus::Approved),
            "rejected" => Some(ChangeRequestStatus::Rejected),
            "completed" => Some(ChangeRequestStatus::Completed),
            "pending-owner-approval" => Some(ChangeRequestStatus::PendingOwnerApproval),
            _ => None,
        }
    }

    /// Still waiting on an approver
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ChangeRequestStatus::Pending | ChangeRequestStatus::PendingOwnerApproval
        )
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to create a new document or amend a live one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub document_id: Option<Uuid>,
    pub document_name: String,
    pub request_type: RequestType,
    pub change_type: Option<ChangeType>,
    pub status: ChangeRequestStatus,
    pub requestor: Person,
    pub approvers: Vec<Person>,
    pub department: Option<String>,
    pub description: Option<String>,
    /// Document details for new-requests
    pub document_type: Option<DocumentType>,
    pub language: Option<Language>,
    pub proposed_version: String,
    pub comments: Vec<String>,
    pub audit_trail: Vec<AuditEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChangeRequest {
    pub request_type: RequestType,
    pub change_type: Option<ChangeType>,
    pub document_id: Option<Uuid>,
    pub document_name: String,
    pub department: Option<String>,
    pub description: Option<String>,
    /// Explicitly selected approvers; derived when empty
    pub approvers: Vec<Person>,
    /// Document details used when approving a new-request
    pub document_type: Option<DocumentType>,
    pub language: Option<Language>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeRequestFilter {
    pub status: Option<ChangeRequestStatus>,
    pub document_id: Option<Uuid>,
}

/// Add a number of months to a date, clamping to the end of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
