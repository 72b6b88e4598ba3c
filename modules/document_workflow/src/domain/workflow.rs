//! Workflow action planning
//!
//! `plan` turns an action on a document into a [`Plan`]: the status the
//! document ends in, the party it waits on next, the comment to append and
//! the single notification hook to call. `apply` then mutates the document.
//! Both are pure; persistence and side effects live in the service.

use super::capabilities::{acting_role, authorize, ActionKind};
use super::state_machine::{validate_transition, TransitionCause};
use crate::contract::{
    ActorContext, AuditEvent, AuditKind, ChangeRequest, Document, DocumentStatus, Party, Person,
    Role, WorkflowError,
};
use chrono::{DateTime, Utc};

/// Action requested on a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Controller forwards a document under review or answers a query
    TakeAction {
        forward_to: Option<Party>,
        note: Option<String>,
    },
    Approve {
        note: Option<String>,
    },
    Reject {
        reason: String,
    },
    Query {
        text: String,
    },
    StartReview {
        note: Option<String>,
    },
    UploadRevision {
        note: Option<String>,
    },
    PushLive {
        note: Option<String>,
    },
    /// Field edit; `requested` is the status the caller asked for, if any
    Edit {
        requested: Option<DocumentStatus>,
        note: Option<String>,
    },
    CompleteChange {
        note: Option<String>,
    },
    Archive {
        reason: Option<String>,
    },
    Delete {
        reason: Option<String>,
    },
    /// Explicit status change along the transition table
    Transition {
        target: DocumentStatus,
        note: Option<String>,
    },
}

/// How `pendingWith` changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingUpdate {
    Keep,
    Set(Option<Party>),
}

/// Notification hook to call after the mutation is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    DocumentLive,
    Review(Vec<Person>),
    OwnerForApproval,
    ControllerQuery(String),
    Rejection(String),
    Approved,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub kind: AuditKind,
    pub target: DocumentStatus,
    pub pending: PendingUpdate,
    pub comment: String,
    pub notification: Option<Notification>,
}

impl Plan {
    fn new(kind: AuditKind, target: DocumentStatus, comment: String) -> Self {
        Self {
            kind,
            target,
            pending: PendingUpdate::Keep,
            comment,
            notification: None,
        }
    }

    fn pending(mut self, party: Option<Party>) -> Self {
        self.pending = PendingUpdate::Set(party);
        self
    }

    fn notify(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }
}

/// Party a document waits on by default once it reaches a status
pub fn default_party(status: DocumentStatus) -> Option<Party> {
    match status {
        DocumentStatus::Approved | DocumentStatus::Queried => Some(Party::DocumentController),
        DocumentStatus::UnderReview => Some(Party::Reviewer),
        DocumentStatus::PendingCreatorApproval | DocumentStatus::UnderRevision => {
            Some(Party::DocumentCreator)
        }
        DocumentStatus::PendingRequesterApproval => Some(Party::DocumentRequester),
        DocumentStatus::PendingOwnerApproval => Some(Party::DocumentOwner),
        _ => None,
    }
}

/// People behind a party on this document
pub fn recipients(doc: &Document, party: &Party) -> Vec<Person> {
    match party {
        Party::DocumentOwner => doc.document_owners.clone(),
        Party::DocumentCreator => doc.document_creators.clone(),
        Party::DocumentRequester => doc.requester.iter().cloned().collect(),
        Party::Reviewer if !doc.current_reviewers.is_empty() => doc.current_reviewers.clone(),
        Party::Reviewer => doc.reviewers.clone(),
        Party::DocumentController | Party::Other(_) => Vec::new(),
    }
}

/// Hook for a document that reached `status` and now waits on `party`
fn hook_for(doc: &Document, status: DocumentStatus, party: Option<&Party>) -> Option<Notification> {
    match (party, status) {
        (None, DocumentStatus::Live) => Some(Notification::DocumentLive),
        (None, DocumentStatus::Archived | DocumentStatus::Deleted) => Some(Notification::Retired),
        (None, _) => None,
        (Some(Party::DocumentController), DocumentStatus::Approved) => Some(Notification::Approved),
        (Some(Party::DocumentController), DocumentStatus::Queried) => {
            Some(Notification::ControllerQuery(String::new()))
        }
        (Some(Party::DocumentOwner), _) => Some(Notification::OwnerForApproval),
        (Some(party), _) => {
            let people = recipients(doc, party);
            (!people.is_empty()).then_some(Notification::Review(people))
        }
    }
}

/// Party a controller forwards to when none is named.
///
/// A query raised by the creator goes to the requester and the other way
/// round; anything else goes to the requester.
pub fn derive_forward_party(doc: &Document) -> Party {
    match doc.last_query_origin() {
        Some(Role::Requester) => Party::DocumentCreator,
        _ => Party::DocumentRequester,
    }
}

fn with_note(base: String, note: &Option<String>) -> String {
    match note.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => format!("{}: {}", base, note),
        _ => base,
    }
}

fn require(field: &str, value: &str) -> Result<String, WorkflowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn move_to(
    doc: &Document,
    target: DocumentStatus,
    cause: TransitionCause,
    role: Role,
) -> Result<DocumentStatus, WorkflowError> {
    if target == doc.status {
        return Ok(target);
    }
    validate_transition(doc.status, target, cause, role)
}

/// Plan an action for an actor. Fails without touching anything.
pub fn plan(
    doc: &Document,
    actor: &ActorContext,
    action: &WorkflowAction,
) -> Result<Plan, WorkflowError> {
    let kind = match action {
        WorkflowAction::TakeAction { .. } => Some(ActionKind::TakeAction),
        WorkflowAction::Approve { .. } => Some(ActionKind::Approve),
        WorkflowAction::Reject { .. } => Some(ActionKind::Reject),
        WorkflowAction::Query { .. } => Some(ActionKind::Query),
        WorkflowAction::StartReview { .. } => Some(ActionKind::StartReview),
        WorkflowAction::UploadRevision { .. } => Some(ActionKind::UploadRevision),
        WorkflowAction::PushLive { .. } => Some(ActionKind::PushLive),
        WorkflowAction::Edit { .. } => Some(ActionKind::Edit),
        WorkflowAction::CompleteChange { .. } => Some(ActionKind::CompleteChange),
        WorkflowAction::Archive { .. } => Some(ActionKind::Archive),
        WorkflowAction::Delete { .. } => Some(ActionKind::Delete),
        WorkflowAction::Transition { .. } => None,
    };
    if let Some(kind) = kind {
        authorize(doc, actor, kind)?;
    }

    let role = acting_role(doc, actor);
    let by = actor.role.label();
    let current = doc.status;
    let flow = TransitionCause::Workflow;

    match action {
        WorkflowAction::TakeAction { forward_to, note } => {
            let party = forward_to.clone().unwrap_or_else(|| derive_forward_party(doc));
            let target = move_to(doc, DocumentStatus::UnderReview, flow, actor.role)?;
            let comment = with_note(format!("Controller Action: forwarded to {}", party), note);
            let people = recipients(doc, &party);
            Ok(Plan::new(AuditKind::ControllerAction, target, comment)
                .pending(Some(party))
                .notify(Notification::Review(people)))
        }

        WorkflowAction::Approve { note } => {
            let comment = with_note(format!("Approved by {}", by), note);
            let (target, party) = match (role, current) {
                (Role::Reviewer, DocumentStatus::UnderReview) => {
                    (DocumentStatus::PendingCreatorApproval, Party::DocumentCreator)
                }
                (Role::DocumentCreator, DocumentStatus::UnderReview) => {
                    (DocumentStatus::UnderReview, Party::DocumentRequester)
                }
                (Role::DocumentCreator, DocumentStatus::PendingCreatorApproval) => {
                    (DocumentStatus::PendingRequesterApproval, Party::DocumentRequester)
                }
                (Role::Requester, DocumentStatus::UnderReview) => {
                    (DocumentStatus::Approved, Party::DocumentController)
                }
                (Role::Requester, DocumentStatus::PendingRequesterApproval) => {
                    (DocumentStatus::UnderRevision, Party::DocumentCreator)
                }
                (
                    Role::DocumentOwner,
                    DocumentStatus::UnderReview | DocumentStatus::PendingOwnerApproval,
                ) => (DocumentStatus::Approved, Party::DocumentController),
                _ => {
                    return Err(WorkflowError::InvalidTransition {
                        from: current,
                        to: DocumentStatus::Approved,
                        role: actor.role,
                    })
                }
            };
            let target = move_to(doc, target, flow, actor.role)?;
            let notification = match party {
                Party::DocumentController => Notification::Approved,
                ref other => Notification::Review(recipients(doc, other)),
            };
            Ok(Plan::new(AuditKind::Approved, target, comment)
                .pending(Some(party))
                .notify(notification))
        }

        WorkflowAction::Reject { reason } => {
            let reason = require("reason", reason)?;
            let (target, party) = match (role, current) {
                (Role::DocumentOwner | Role::Reviewer, DocumentStatus::UnderReview) => {
                    (DocumentStatus::UnderReview, Party::DocumentController)
                }
                (Role::DocumentCreator, DocumentStatus::PendingCreatorApproval) => {
                    (DocumentStatus::UnderReview, Party::DocumentController)
                }
                (Role::Requester, DocumentStatus::PendingRequesterApproval) => {
                    (DocumentStatus::PendingCreatorApproval, Party::DocumentCreator)
                }
                (Role::DocumentOwner, DocumentStatus::PendingOwnerApproval) => {
                    (DocumentStatus::UnderRevision, Party::DocumentCreator)
                }
                _ => {
                    return Err(WorkflowError::InvalidTransition {
                        from: current,
                        to: DocumentStatus::Rejected,
                        role: actor.role,
                    })
                }
            };
            let target = move_to(doc, target, flow, actor.role)?;
            Ok(Plan::new(AuditKind::Rejected, target, format!("Rejected: {}", reason))
                .pending(Some(party))
                .notify(Notification::Rejection(reason)))
        }

        WorkflowAction::Query { text } => {
            let text = require("query", text)?;
            let target = move_to(doc, DocumentStatus::Queried, flow, actor.role)?;
            let comment = format!("Query: {}", text);
            // Reviewer queries go straight back to the requester
            let plan = match role {
                Role::Reviewer => {
                    let party = Party::DocumentRequester;
                    let mut plan = Plan::new(AuditKind::Queried, target, comment);
                    plan.notification = hook_for(doc, target, Some(&party));
                    plan.pending(Some(party))
                }
                _ => Plan::new(AuditKind::Queried, target, comment)
                    .pending(Some(Party::DocumentController))
                    .notify(Notification::ControllerQuery(text)),
            };
            Ok(plan)
        }

        WorkflowAction::StartReview { note } => {
            let target = move_to(doc, DocumentStatus::UnderReview, flow, actor.role)?;
            let comment = with_note(format!("Review started by {}", by), note);
            Ok(Plan::new(AuditKind::ReviewStarted, target, comment)
                .pending(Some(Party::Reviewer))
                .notify(Notification::Review(doc.reviewers.clone())))
        }

        WorkflowAction::UploadRevision { note } => {
            let target = move_to(doc, DocumentStatus::PendingOwnerApproval, flow, actor.role)?;
            let comment = with_note(format!("Revision uploaded by {}", by), note);
            Ok(Plan::new(AuditKind::RevisionUploaded, target, comment)
                .pending(Some(Party::DocumentOwner))
                .notify(Notification::OwnerForApproval))
        }

        WorkflowAction::PushLive { note } => {
            let target = move_to(doc, DocumentStatus::Live, flow, actor.role)?;
            let comment = with_note(format!("Pushed live by {}", by), note);
            Ok(Plan::new(AuditKind::PushedLive, target, comment)
                .pending(None)
                .notify(Notification::DocumentLive))
        }

        WorkflowAction::Edit { requested, note } => {
            let comment = with_note(format!("Edited by {}", by), note);
            if current == DocumentStatus::Live {
                let target = validate_transition(
                    current,
                    requested.unwrap_or(current),
                    TransitionCause::Edit,
                    actor.role,
                )?;
                return Ok(Plan::new(AuditKind::Edited, target, comment)
                    .pending(Some(Party::DocumentOwner))
                    .notify(Notification::OwnerForApproval));
            }

            let target = match requested {
                Some(requested) if *requested != current => {
                    if !matches!(actor.role, Role::Admin | Role::DocumentController) {
                        return Err(WorkflowError::forbidden(
                            actor.role,
                            "change the status while editing",
                        ));
                    }
                    validate_transition(current, *requested, TransitionCause::Edit, actor.role)?
                }
                _ => current,
            };
            Ok(Plan::new(AuditKind::Edited, target, comment))
        }

        WorkflowAction::CompleteChange { note } => {
            let target = move_to(doc, DocumentStatus::Live, flow, actor.role)?;
            let comment = with_note(format!("Change completed by {}", by), note);
            Ok(Plan::new(AuditKind::ChangeCompleted, target, comment)
                .pending(None)
                .notify(Notification::DocumentLive))
        }

        WorkflowAction::Archive { reason } => {
            let target = validate_transition(current, DocumentStatus::Archived, flow, actor.role)?;
            let comment = with_note("Archived".to_string(), reason);
            Ok(Plan::new(AuditKind::Archived, target, comment)
                .pending(None)
                .notify(Notification::Retired))
        }

        WorkflowAction::Delete { reason } => {
            let target = validate_transition(current, DocumentStatus::Deleted, flow, actor.role)?;
            let comment = with_note("Deleted".to_string(), reason);
            Ok(Plan::new(AuditKind::Deleted, target, comment)
                .pending(None)
                .notify(Notification::Retired))
        }

        WorkflowAction::Transition { target, note } => {
            if !matches!(actor.role, Role::Admin | Role::DocumentController) {
                return Err(WorkflowError::forbidden(actor.role, "change the document status"));
            }
            if actor.role == Role::DocumentController && current == DocumentStatus::Deleted {
                return Err(WorkflowError::forbidden(actor.role, "restore a deleted document"));
            }
            let target = validate_transition(current, *target, flow, actor.role)?;
            let party = default_party(target);
            let comment = with_note(format!("Status changed from {} to {}", current, target), note);
            let mut plan = Plan::new(AuditKind::StatusChanged, target, comment);
            if party != doc.pending_with || target != current {
                plan.notification = hook_for(doc, target, party.as_ref());
            }
            Ok(plan.pending(party))
        }
    }
}

/// Plan moving a live document into `live-cr` for an approved change request
pub fn plan_change_request_approval(
    doc: &Document,
    actor: &ActorContext,
    cr: &ChangeRequest,
) -> Result<Plan, WorkflowError> {
    if doc.status != DocumentStatus::Live {
        return Err(WorkflowError::Conflict {
            reason: format!(
                "document {} is '{}'; change requests apply to live documents only",
                doc.id, doc.status
            ),
        });
    }
    let target = validate_transition(
        doc.status,
        DocumentStatus::LiveCr,
        TransitionCause::ChangeRequestApproval,
        actor.role,
    )?;
    let comment = format!(
        "Change request approved by {}: version {} in progress",
        actor.role.label(),
        cr.proposed_version
    );
    Ok(Plan::new(AuditKind::ChangeRequestApproved, target, comment)
        .pending(Some(Party::DocumentOwner))
        .notify(Notification::OwnerForApproval))
}

/// Plan returning a `live-cr` document to `live` when its change request completes
pub fn plan_change_request_completion(
    doc: &Document,
    actor: &ActorContext,
    cr: &ChangeRequest,
) -> Result<Plan, WorkflowError> {
    let target = validate_transition(
        doc.status,
        DocumentStatus::Live,
        TransitionCause::Workflow,
        actor.role,
    )?;
    let comment = format!(
        "Change request completed by {}: version {}",
        actor.role.label(),
        cr.proposed_version
    );
    Ok(Plan::new(AuditKind::ChangeRequestCompleted, target, comment)
        .pending(None)
        .notify(Notification::DocumentLive))
}

/// Append one comment and one audit event. Returns the event.
pub fn record(
    doc: &mut Document,
    actor: &ActorContext,
    kind: AuditKind,
    from: Option<DocumentStatus>,
    details: String,
    now: DateTime<Utc>,
) -> AuditEvent {
    let event = AuditEvent {
        kind,
        actor_role: actor.role,
        actor_id: actor.user_id.clone(),
        from_status: from,
        to_status: Some(doc.status),
        pending_with: doc.pending_with.clone(),
        details: details.clone(),
        timestamp: now,
    };
    doc.comments.push(details);
    doc.audit_trail.push(event.clone());
    doc.updated_at = now;
    event
}

/// Apply a plan to a document
pub fn apply(doc: &mut Document, actor: &ActorContext, plan: &Plan, now: DateTime<Utc>) -> AuditEvent {
    let from = doc.status;
    doc.status = plan.target;
    if let PendingUpdate::Set(party) = &plan.pending {
        doc.pending_with = party.clone();
    }

    let today = now.date_naive();
    match plan.kind {
        AuditKind::ReviewStarted => {
            doc.current_reviewers = doc.reviewers.clone();
            doc.review_start_date = Some(today);
        }
        AuditKind::PushedLive => {
            doc.effective_date.get_or_insert(today);
            doc.current_reviewers.clear();
        }
        AuditKind::Archived | AuditKind::Deleted => doc.current_reviewers.clear(),
        _ => {}
    }

    record(doc, actor, plan.kind, Some(from), plan.comment.clone(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::DocumentType;
    use uuid::Uuid;

    fn person(id: &str) -> Person {
        Person::new(id, id, format!("{}@example.com", id))
    }

    fn doc(status: DocumentStatus) -> Document {
        Document {
            id: Uuid::new_v4(),
            sop_name: "Cash Handling".to_string(),
            document_code: "SDG-FIN-SOP-01".to_string(),
            document_number: None,
            version_number: "1.0".to_string(),
            document_type: DocumentType::Sop,
            department: "Finance".to_string(),
            country: None,
            description: None,
            language: None,
            status,
            pending_with: None,
            upload_date: None,
            last_revision_date: None,
            next_revision_date: None,
            review_start_date: None,
            review_deadline: None,
            effective_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            requester: Some(person("req")),
            document_owners: vec![person("owner")],
            reviewers: vec![person("rev")],
            document_creators: vec![person("creator")],
            compliance_contacts: Vec::new(),
            current_reviewers: Vec::new(),
            comments: Vec::new(),
            audit_trail: Vec::new(),
            attachment_name: None,
            file_url: None,
        }
    }

    fn controller() -> ActorContext {
        ActorContext::new("ctrl", Role::DocumentController)
    }

    fn run(d: &mut Document, actor: &ActorContext, action: WorkflowAction) -> Plan {
        let plan = plan(d, actor, &action).unwrap();
        apply(d, actor, &plan, Utc::now());
        plan
    }

    #[test]
    fn test_reviewer_approval_hands_to_creator() {
        let mut d = doc(DocumentStatus::UnderReview);
        let plan = run(&mut d, &ActorContext::new("rev", Role::Reviewer), WorkflowAction::Approve { note: None });
        assert_eq!(d.status, DocumentStatus::PendingCreatorApproval);
        assert_eq!(d.pending_with, Some(Party::DocumentCreator));
        assert_eq!(plan.notification, Some(Notification::Review(vec![person("creator")])));
        assert_eq!(d.comments, vec!["Approved by Reviewer".to_string()]);
    }

    #[test]
    fn test_creator_and_requester_approval_chain() {
        let mut d = doc(DocumentStatus::PendingCreatorApproval);
        run(&mut d, &ActorContext::new("creator", Role::DocumentCreator), WorkflowAction::Approve { note: None });
        assert_eq!(d.status, DocumentStatus::PendingRequesterApproval);
        assert_eq!(d.pending_with, Some(Party::DocumentRequester));

        run(&mut d, &ActorContext::new("req", Role::Requester), WorkflowAction::Approve { note: Some("fine".into()) });
        assert_eq!(d.status, DocumentStatus::UnderRevision);
        assert_eq!(d.pending_with, Some(Party::DocumentCreator));
        assert_eq!(d.comments.last().unwrap(), "Approved by Document Requester: fine");

        let plan = run(&mut d, &ActorContext::new("creator", Role::DocumentCreator), WorkflowAction::UploadRevision { note: None });
        assert_eq!(d.status, DocumentStatus::PendingOwnerApproval);
        assert_eq!(plan.notification, Some(Notification::OwnerForApproval));

        let plan = run(&mut d, &ActorContext::new("owner", Role::DocumentOwner), WorkflowAction::Approve { note: None });
        assert_eq!(d.status, DocumentStatus::Approved);
        assert_eq!(d.pending_with, Some(Party::DocumentController));
        assert_eq!(plan.notification, Some(Notification::Approved));
    }

    #[test]
    fn test_creator_under_review_keeps_status() {
        let mut d = doc(DocumentStatus::UnderReview);
        d.pending_with = Some(Party::DocumentCreator);
        run(&mut d, &ActorContext::new("creator", Role::DocumentCreator), WorkflowAction::Approve { note: None });
        assert_eq!(d.status, DocumentStatus::UnderReview);
        assert_eq!(d.pending_with, Some(Party::DocumentRequester));
    }

    #[test]
    fn test_rejections_route_back() {
        let cases = [
            (DocumentStatus::UnderReview, ActorContext::new("owner", Role::DocumentOwner), DocumentStatus::UnderReview, Party::DocumentController),
            (DocumentStatus::PendingCreatorApproval, ActorContext::new("creator", Role::DocumentCreator), DocumentStatus::UnderReview, Party::DocumentController),
            (DocumentStatus::PendingRequesterApproval, ActorContext::new("req", Role::Requester), DocumentStatus::PendingCreatorApproval, Party::DocumentCreator),
            (DocumentStatus::PendingOwnerApproval, ActorContext::new("owner", Role::DocumentOwner), DocumentStatus::UnderRevision, Party::DocumentCreator),
        ];
        for (from, actor, to, party) in cases {
            let mut d = doc(from);
            let plan = run(&mut d, &actor, WorkflowAction::Reject { reason: "missing annex".into() });
            assert_eq!(d.status, to, "from {}", from);
            assert_eq!(d.pending_with, Some(party));
            assert_eq!(d.comments, vec!["Rejected: missing annex".to_string()]);
            assert_eq!(plan.notification, Some(Notification::Rejection("missing annex".into())));
        }
    }

    #[test]
    fn test_reject_needs_reason() {
        let d = doc(DocumentStatus::UnderReview);
        let err = plan(&d, &ActorContext::new("owner", Role::DocumentOwner), &WorkflowAction::Reject { reason: " ".into() })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { .. }));
    }

    #[test]
    fn test_query_routing_and_take_action_derivation() {
        let mut d = doc(DocumentStatus::UnderReview);
        let plan = run(&mut d, &ActorContext::new("rev", Role::Reviewer), WorkflowAction::Query { text: "which annex?".into() });
        assert_eq!(d.status, DocumentStatus::Queried);
        assert_eq!(d.pending_with, Some(Party::DocumentRequester));
        assert_eq!(plan.notification, Some(Notification::Review(vec![person("req")])));

        // Without a requester on record nobody is notified
        let mut d = doc(DocumentStatus::UnderReview);
        d.requester = None;
        let plan = run(&mut d, &ActorContext::new("rev", Role::Reviewer), WorkflowAction::Query { text: "which annex?".into() });
        assert_eq!(plan.notification, None);

        // Query from the requester is forwarded to the creator
        let mut d = doc(DocumentStatus::UnderReview);
        run(&mut d, &ActorContext::new("req", Role::Requester), WorkflowAction::Query { text: "scope?".into() });
        assert_eq!(d.pending_with, Some(Party::DocumentController));
        run(&mut d, &controller(), WorkflowAction::TakeAction { forward_to: None, note: None });
        assert_eq!(d.status, DocumentStatus::UnderReview);
        assert_eq!(d.pending_with, Some(Party::DocumentCreator));
        assert_eq!(d.comments.last().unwrap(), "Controller Action: forwarded to Document Creator");
    }

    #[test]
    fn test_take_action_defaults_to_requester_and_honours_override() {
        let mut d = doc(DocumentStatus::UnderReview);
        run(&mut d, &controller(), WorkflowAction::TakeAction { forward_to: None, note: None });
        assert_eq!(d.pending_with, Some(Party::DocumentRequester));

        run(&mut d, &controller(), WorkflowAction::TakeAction { forward_to: Some(Party::DocumentOwner), note: None });
        assert_eq!(d.pending_with, Some(Party::DocumentOwner));
    }

    #[test]
    fn test_edit_on_live_goes_to_live_cr_whatever_was_requested() {
        for requested in [None, Some(DocumentStatus::Live), Some(DocumentStatus::Approved)] {
            let mut d = doc(DocumentStatus::Live);
            let plan = run(&mut d, &ActorContext::new("owner", Role::DocumentOwner), WorkflowAction::Edit { requested, note: None });
            assert_eq!(d.status, DocumentStatus::LiveCr);
            assert_eq!(d.pending_with, Some(Party::DocumentOwner));
            assert_eq!(plan.notification, Some(Notification::OwnerForApproval));
        }
    }

    #[test]
    fn test_edit_status_change_is_controller_only() {
        let d = doc(DocumentStatus::Draft);
        let requester = ActorContext::new("req", Role::Requester);
        let err = plan(&d, &requester, &WorkflowAction::Edit { requested: Some(DocumentStatus::UnderReview), note: None })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));

        let err = plan(&d, &controller(), &WorkflowAction::Edit { requested: Some(DocumentStatus::Approved), note: None })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_transition_uses_default_party() {
        let mut d = doc(DocumentStatus::Approved);
        let plan = run(&mut d, &controller(), WorkflowAction::Transition { target: DocumentStatus::Live, note: None });
        assert_eq!(d.pending_with, None);
        assert_eq!(plan.notification, Some(Notification::DocumentLive));
        assert_eq!(d.comments, vec!["Status changed from approved to live".to_string()]);

        let err = plan_for_reviewer_transition();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));
    }

    fn plan_for_reviewer_transition() -> WorkflowError {
        let d = doc(DocumentStatus::UnderReview);
        plan(&d, &ActorContext::new("rev", Role::Reviewer), &WorkflowAction::Transition { target: DocumentStatus::Approved, note: None })
            .unwrap_err()
    }

    #[test]
    fn test_archive_is_admin_only() {
        let mut d = doc(DocumentStatus::UnderReview);
        let err = plan(&d, &controller(), &WorkflowAction::Archive { reason: None }).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));

        let plan = run(&mut d, &ActorContext::new("root", Role::Admin), WorkflowAction::Archive { reason: Some("superseded".into()) });
        assert_eq!(d.status, DocumentStatus::Archived);
        assert_eq!(plan.notification, Some(Notification::Retired));
        assert_eq!(d.comments, vec!["Archived: superseded".to_string()]);
    }

    #[test]
    fn test_start_review_round() {
        let mut d = doc(DocumentStatus::Draft);
        run(&mut d, &controller(), WorkflowAction::StartReview { note: None });
        assert_eq!(d.status, DocumentStatus::UnderReview);
        assert_eq!(d.pending_with, Some(Party::Reviewer));
        assert_eq!(d.current_reviewers, d.reviewers);
        assert!(d.review_start_date.is_some());
    }

    #[test]
    fn test_every_action_appends_one_comment_and_one_event() {
        let mut d = doc(DocumentStatus::UnderReview);
        let actors_and_actions = [
            (controller(), WorkflowAction::TakeAction { forward_to: None, note: None }),
            (ActorContext::new("req", Role::Requester), WorkflowAction::Approve { note: None }),
            (controller(), WorkflowAction::PushLive { note: None }),
            (ActorContext::new("owner", Role::DocumentOwner), WorkflowAction::Edit { requested: None, note: None }),
            (ActorContext::new("owner", Role::DocumentOwner), WorkflowAction::CompleteChange { note: None }),
        ];
        for (i, (actor, action)) in actors_and_actions.into_iter().enumerate() {
            run(&mut d, &actor, action);
            assert_eq!(d.comments.len(), i + 1);
            assert_eq!(d.audit_trail.len(), i + 1);
        }
        assert_eq!(d.status, DocumentStatus::Live);
        assert_eq!(d.pending_with, None);
    }
}
