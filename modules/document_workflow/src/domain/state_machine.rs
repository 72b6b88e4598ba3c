//! Document status state machine
//!
//! The transition table is the single authority on which status changes are
//! legal. Two rules sit beside it: the live-CR override (edits and approved
//! change requests on a live document always land in `live-cr`) and the admin
//! shortcut from `under-review` to `archived`/`deleted`.

use crate::contract::{ChangeRequestStatus, DocumentStatus, Role, WorkflowError};

/// What caused a status change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// Field edit on the document
    Edit,
    /// Approval of a change request targeting the document
    ChangeRequestApproval,
    /// Any other workflow action
    Workflow,
}

/// Legal targets for each status
pub fn allowed_targets(current: DocumentStatus) -> &'static [DocumentStatus] {
    use DocumentStatus::*;
    match current {
        Draft => &[UnderReview],
        UnderReview => &[PendingCreatorApproval, Queried, Approved],
        PendingCreatorApproval => &[PendingRequesterApproval, UnderReview],
        PendingRequesterApproval => &[UnderRevision, PendingCreatorApproval],
        UnderRevision => &[PendingOwnerApproval],
        PendingOwnerApproval => &[Approved, UnderRevision],
        Approved => &[Live],
        Live => &[UnderReview, LiveCr],
        LiveCr => &[Live, UnderReview],
        Queried => &[UnderReview],
        Reviewed => &[UnderReview],
        Rejected => &[UnderReview],
        Archived => &[UnderReview],
        Deleted => &[UnderReview],
        PendingWithRequester => &[UnderReview],
    }
}

/// Pure table lookup
pub fn can_transition(current: DocumentStatus, target: DocumentStatus) -> bool {
    allowed_targets(current).contains(&target)
}

/// Admin-only moves outside the table
pub fn is_administrative_shortcut(current: DocumentStatus, target: DocumentStatus) -> bool {
    current == DocumentStatus::UnderReview
        && matches!(target, DocumentStatus::Archived | DocumentStatus::Deleted)
}

/// Apply the live-CR override to a nominally requested target
pub fn resolve_target(
    current: DocumentStatus,
    requested: DocumentStatus,
    cause: TransitionCause,
) -> DocumentStatus {
    match (current, cause) {
        (DocumentStatus::Live, TransitionCause::Edit | TransitionCause::ChangeRequestApproval) => {
            DocumentStatus::LiveCr
        }
        _ => requested,
    }
}

/// Resolve and validate a requested transition.
///
/// Returns the status the document ends up in, or `InvalidTransition`.
pub fn validate_transition(
    current: DocumentStatus,
    requested: DocumentStatus,
    cause: TransitionCause,
    role: Role,
) -> Result<DocumentStatus, WorkflowError> {
    let target = resolve_target(current, requested, cause);
    if can_transition(current, target)
        || (role == Role::Admin && is_administrative_shortcut(current, target))
    {
        Ok(target)
    } else {
        Err(WorkflowError::InvalidTransition {
            from: current,
            to: target,
            role,
        })
    }
}

impl DocumentStatus {
    /// Map any legacy spelling onto the canonical status.
    ///
    /// Case, spaces, underscores and hyphens are ignored, so "Under Review",
    /// "under_review" and "UNDER-REVIEW" all map to `UnderReview`.
    pub fn from_legacy(value: &str) -> Result<DocumentStatus, WorkflowError> {
        let key: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let status = match key.as_str() {
            "draft" => DocumentStatus::Draft,
            "underreview" | "inreview" => DocumentStatus::UnderReview,
            "pendingcreatorapproval" => DocumentStatus::PendingCreatorApproval,
            "pendingrequesterapproval" => DocumentStatus::PendingRequesterApproval,
            "underrevision" => DocumentStatus::UnderRevision,
            "pendingownerapproval" => DocumentStatus::PendingOwnerApproval,
            "approved" => DocumentStatus::Approved,
            "live" | "published" => DocumentStatus::Live,
            "livecr" | "livechangerequest" => DocumentStatus::LiveCr,
            "queried" => DocumentStatus::Queried,
            "reviewed" => DocumentStatus::Reviewed,
            "archived" => DocumentStatus::Archived,
            "deleted" => DocumentStatus::Deleted,
            "rejected" => DocumentStatus::Rejected,
            "pendingwithrequester" => DocumentStatus::PendingWithRequester,
            _ => {
                return Err(WorkflowError::validation(
                    "status",
                    format!("unknown document status '{}'", value),
                ))
            }
        };
        Ok(status)
    }
}

impl ChangeRequestStatus {
    /// Legal change-request status moves
    pub fn can_transition(&self, target: ChangeRequestStatus) -> bool {
        use ChangeRequestStatus::*;
        matches!(
            (self, target),
            (Pending, Approved)
                | (Pending, Rejected)
                | (PendingOwnerApproval, Approved)
                | (PendingOwnerApproval, Rejected)
                | (Approved, Completed)
        )
    }
}
