//! Role-capability resolver
//!
//! `capabilities` answers what a role may do with a document in a given
//! status. `document_capabilities` narrows that for one concrete document and
//! actor (assignment and pending-with gates). Route handlers and the service
//! only ever ask these functions; they never re-derive the rules.

use crate::contract::{
    ActorContext, Capabilities, Document, DocumentStatus, Party, Role, WorkflowError,
};

/// Document action that needs a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Approve,
    Reject,
    Query,
    StartReview,
    PushLive,
    UploadRevision,
    TakeAction,
    Edit,
    CompleteChange,
    Archive,
    Delete,
}

impl ActionKind {
    pub fn verb(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approve the document",
            ActionKind::Reject => "reject the document",
            ActionKind::Query => "query the document",
            ActionKind::StartReview => "start a review",
            ActionKind::PushLive => "push the document live",
            ActionKind::UploadRevision => "upload a revision",
            ActionKind::TakeAction => "take controller action",
            ActionKind::Edit => "edit the document",
            ActionKind::CompleteChange => "complete the change",
            ActionKind::Archive => "archive the document",
            ActionKind::Delete => "delete the document",
        }
    }

    /// Status the action nominally leads to
    pub fn nominal_target(&self) -> DocumentStatus {
        match self {
            ActionKind::Approve => DocumentStatus::Approved,
            ActionKind::Reject => DocumentStatus::Rejected,
            ActionKind::Query => DocumentStatus::Queried,
            ActionKind::StartReview | ActionKind::TakeAction => DocumentStatus::UnderReview,
            ActionKind::PushLive | ActionKind::CompleteChange => DocumentStatus::Live,
            ActionKind::UploadRevision => DocumentStatus::PendingOwnerApproval,
            ActionKind::Edit => DocumentStatus::LiveCr,
            ActionKind::Archive => DocumentStatus::Archived,
            ActionKind::Delete => DocumentStatus::Deleted,
        }
    }

    pub fn allowed_by(&self, caps: &Capabilities) -> bool {
        match self {
            ActionKind::Approve => caps.can_approve,
            ActionKind::Reject => caps.can_reject,
            ActionKind::Query => caps.can_query,
            ActionKind::StartReview => caps.can_start_review,
            ActionKind::PushLive => caps.can_push_live,
            ActionKind::UploadRevision => caps.can_upload_revision,
            ActionKind::TakeAction => caps.can_take_action,
            ActionKind::Edit => caps.can_edit,
            ActionKind::CompleteChange => caps.can_complete_change,
            ActionKind::Archive => caps.can_archive,
            ActionKind::Delete => caps.can_delete,
        }
    }
}

/// Resolve capabilities for a `(status, role)` pair. Pure.
pub fn capabilities(status: DocumentStatus, role: Role) -> Capabilities {
    use DocumentStatus::*;

    let in_any = |set: &[DocumentStatus]| set.contains(&status);
    let can_view = status != Deleted;

    match role {
        Role::DocumentController => Capabilities {
            can_view,
            can_edit: in_any(&[Draft, UnderReview, Queried, Live, LiveCr]),
            can_take_action: in_any(&[UnderReview, Queried]),
            can_push_live: status == Approved,
            can_start_review: in_any(&[
                Draft,
                Live,
                LiveCr,
                Reviewed,
                Rejected,
                Archived,
                PendingWithRequester,
            ]),
            can_complete_change: status == LiveCr,
            ..Capabilities::default()
        },
        Role::DocumentOwner => Capabilities {
            can_view,
            can_edit: in_any(&[Live, LiveCr]),
            can_approve: in_any(&[UnderReview, PendingOwnerApproval]),
            can_reject: in_any(&[UnderReview, PendingOwnerApproval]),
            can_query: status == UnderReview,
            can_start_review: in_any(&[Draft, Reviewed, Rejected, PendingWithRequester]),
            can_complete_change: status == LiveCr,
            ..Capabilities::default()
        },
        Role::Reviewer => Capabilities {
            can_view,
            can_approve: status == UnderReview,
            can_reject: status == UnderReview,
            can_query: status == UnderReview,
            ..Capabilities::default()
        },
        Role::DocumentCreator => Capabilities {
            can_view,
            can_edit: in_any(&[Draft, UnderRevision]),
            can_approve: in_any(&[UnderReview, PendingCreatorApproval]),
            can_reject: status == PendingCreatorApproval,
            can_query: status == UnderReview,
            can_upload_revision: status == UnderRevision,
            ..Capabilities::default()
        },
        Role::Requester => Capabilities {
            can_view,
            can_edit: status == Draft,
            can_approve: in_any(&[UnderReview, PendingRequesterApproval]),
            can_reject: status == PendingRequesterApproval,
            can_query: status == UnderReview,
            ..Capabilities::default()
        },
        Role::Admin => admin_capabilities(status),
    }
}

/// Union of every other role, plus the archive/delete shortcut and restore
fn admin_capabilities(status: DocumentStatus) -> Capabilities {
    let mut caps = Role::ALL
        .into_iter()
        .filter(|role| *role != Role::Admin)
        .map(|role| capabilities(status, role))
        .fold(Capabilities::default(), union);

    caps.can_view = true;
    caps.can_archive = status == DocumentStatus::UnderReview;
    caps.can_delete = status == DocumentStatus::UnderReview;
    if status == DocumentStatus::Deleted {
        caps.can_start_review = true;
    }
    caps
}

fn union(a: Capabilities, b: Capabilities) -> Capabilities {
    Capabilities {
        can_view: a.can_view || b.can_view,
        can_edit: a.can_edit || b.can_edit,
        can_approve: a.can_approve || b.can_approve,
        can_reject: a.can_reject || b.can_reject,
        can_query: a.can_query || b.can_query,
        can_start_review: a.can_start_review || b.can_start_review,
        can_push_live: a.can_push_live || b.can_push_live,
        can_upload_revision: a.can_upload_revision || b.can_upload_revision,
        can_take_action: a.can_take_action || b.can_take_action,
        can_complete_change: a.can_complete_change || b.can_complete_change,
        can_archive: a.can_archive || b.can_archive,
        can_delete: a.can_delete || b.can_delete,
    }
}

/// Whether the role holds the action's capability in any status
pub fn role_ever_allows(role: Role, action: ActionKind) -> bool {
    DocumentStatus::ALL
        .into_iter()
        .any(|status| action.allowed_by(&capabilities(status, role)))
}

/// True if the user appears in any person collection on the document
pub fn is_user_assigned_to_document(doc: &Document, user_id: &str, email: Option<&str>) -> bool {
    [
        &doc.document_owners,
        &doc.reviewers,
        &doc.document_creators,
        &doc.compliance_contacts,
        &doc.current_reviewers,
    ]
    .into_iter()
    .flatten()
    .any(|person| person.matches(user_id, email))
}

/// Whether the document shows up in the actor's lists
pub fn is_visible_to(doc: &Document, actor: &ActorContext) -> bool {
    match actor.role {
        Role::Admin | Role::DocumentController => doc.status != DocumentStatus::Deleted,
        role => {
            if doc.status == DocumentStatus::Deleted {
                return false;
            }
            let authored = doc.created_by.as_deref() == Some(actor.user_id.as_str());
            authored || holds_role_on(doc, actor, role)
        }
    }
}

/// Whether the actor appears in the person collection matching the role
fn holds_role_on(doc: &Document, actor: &ActorContext, role: Role) -> bool {
    let listed = |people: &[crate::contract::Person]| people.iter().any(|p| actor.is(p));
    match role {
        Role::DocumentOwner => listed(&doc.document_owners),
        Role::Reviewer => listed(&doc.reviewers) || listed(&doc.current_reviewers),
        Role::DocumentCreator => listed(&doc.document_creators),
        Role::Requester => doc.requester.as_ref().is_some_and(|p| actor.is(p)),
        Role::Admin | Role::DocumentController => true,
    }
}

/// Capabilities of one actor on one document
pub fn document_capabilities(doc: &Document, actor: &ActorContext) -> Capabilities {
    let can_see = match actor.role {
        // Admins keep access to deleted records so they can restore them
        Role::Admin => true,
        _ => is_visible_to(doc, actor),
    };
    if !can_see {
        return Capabilities::default();
    }

    let mut caps = capabilities(doc.status, actor.role);

    // A creator reviews an under-review document only when it waits on them
    if actor.role == Role::DocumentCreator
        && doc.status == DocumentStatus::UnderReview
        && doc.pending_with != Some(Party::DocumentCreator)
    {
        caps.can_approve = false;
        caps.can_query = false;
    }

    caps
}

/// Role whose semantics apply when the actor acts on the document.
///
/// Admins act as whichever party the document is waiting on.
pub fn acting_role(doc: &Document, actor: &ActorContext) -> Role {
    if actor.role != Role::Admin {
        return actor.role;
    }
    match doc.status {
        DocumentStatus::PendingCreatorApproval | DocumentStatus::UnderRevision => {
            Role::DocumentCreator
        }
        DocumentStatus::PendingRequesterApproval => Role::Requester,
        DocumentStatus::Approved | DocumentStatus::Queried => Role::DocumentController,
        DocumentStatus::UnderReview => match doc.pending_with {
            Some(Party::DocumentCreator) => Role::DocumentCreator,
            Some(Party::DocumentRequester) => Role::Requester,
            _ => Role::DocumentOwner,
        },
        _ => Role::DocumentOwner,
    }
}

/// Check the actor may perform the action on the document.
///
/// Distinguishes `Forbidden` (never allowed, not assigned, or gated) from
/// `InvalidTransition` (allowed for the role, but not from this status).
pub fn authorize(
    doc: &Document,
    actor: &ActorContext,
    action: ActionKind,
) -> Result<(), WorkflowError> {
    if action.allowed_by(&document_capabilities(doc, actor)) {
        return Ok(());
    }

    let role = actor.role;
    if role != Role::Admin && !is_visible_to(doc, actor) {
        return Err(WorkflowError::forbidden(
            role,
            format!("{} (not assigned to document {})", action.verb(), doc.id),
        ));
    }
    if !role_ever_allows(role, action) || action.allowed_by(&capabilities(doc.status, role)) {
        return Err(WorkflowError::forbidden(role, action.verb()));
    }
    Err(WorkflowError::InvalidTransition {
        from: doc.status,
        to: action.nominal_target(),
        role,
    })
}
