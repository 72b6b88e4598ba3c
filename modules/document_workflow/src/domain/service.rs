//! Domain service - business logic orchestration
//!
//! Every mutation follows the same order: load, plan on a clone, store the
//! clone, then run side effects. A failed store returns `Internal` and leaves
//! the stored record as it was; failed side effects are only logged.

use super::capabilities::{self, is_visible_to};
use super::events::{AuditRecord, AuditSink, Notifier};
use super::files::{attachment_path, FileStore};
use super::numbering::{generate_document_code, next_version, Version};
use super::repository::{ChangeRequestRepository, DocumentRepository};
use super::validation::{self, earliest_next_revision, require_text};
use super::workflow::{self, Notification, WorkflowAction};
use crate::contract::{
    ActorContext, Attachment, AuditEvent, AuditKind, Capabilities, ChangeRequest,
    ChangeRequestFilter, ChangeRequestStatus, Document, DocumentFilter, DocumentPatch,
    DocumentStatus, DocumentType, Language, NewChangeRequest, NewDocument, Party, Person,
    RequestType, Role, WorkflowError,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Tunables the service reads at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Leading segment of generated document codes
    pub organization_code: String,
    /// Minimum months between revisions
    pub revision_interval_months: u32,
    /// Configured change-request approvers per department (case-insensitive key)
    pub department_approvers: HashMap<String, Vec<Person>>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            organization_code: "SDG".to_string(),
            revision_interval_months: 3,
            department_approvers: HashMap::new(),
        }
    }
}

impl ServiceSettings {
    fn approvers_for(&self, department: &str) -> Option<&Vec<Person>> {
        self.department_approvers
            .iter()
            .find(|(name, people)| name.eq_ignore_ascii_case(department.trim()) && !people.is_empty())
            .map(|(_, people)| people)
    }
}

/// Domain service for the document workflow
pub struct Service {
    documents: Arc<dyn DocumentRepository>,
    change_requests: Arc<dyn ChangeRequestRepository>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
    files: Arc<dyn FileStore>,
    settings: ServiceSettings,
}

fn storage_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> WorkflowError {
    move |e| {
        tracing::error!(operation, error = %e, "storage failure");
        WorkflowError::Internal
    }
}

impl Service {
    /// Create a new service instance
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        change_requests: Arc<dyn ChangeRequestRepository>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
        files: Arc<dyn FileStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            documents,
            change_requests,
            notifier,
            audit,
            files,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    // ===== Document Operations =====

    /// Create a document. It always starts `under-review` with nobody pending.
    pub async fn create_document(
        &self,
        actor: &ActorContext,
        input: NewDocument,
    ) -> Result<Document, WorkflowError> {
        if actor.role == Role::Reviewer {
            return Err(WorkflowError::forbidden(actor.role, "create documents"));
        }
        let (doc, event) = self.prepare_document(actor, input).await?;
        let saved = self.save_document(&doc, "create_document").await?;

        tracing::info!(
            document_id = %saved.id,
            document_code = %saved.document_code,
            actor = %actor.user_id,
            "document created"
        );
        self.audit_document(&saved, &event).await;
        Ok(saved)
    }

    /// Validate the input and build the new document without storing it
    async fn prepare_document(
        &self,
        actor: &ActorContext,
        mut input: NewDocument,
    ) -> Result<(Document, AuditEvent), WorkflowError> {
        validation::validate_new_document(&mut input, self.settings.revision_interval_months)?;

        let version = match input.version_number.as_deref() {
            Some(raw) => Version::parse(raw)?,
            None => Version::INITIAL,
        };
        let code = self
            .next_document_code(&input.department, input.document_type, input.language)
            .await?;

        let now = Utc::now();
        let requester = input
            .requester
            .take()
            .or_else(|| (actor.role == Role::Requester).then(|| actor.as_person()));
        let comment = input
            .comment
            .take()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| format!("Created by {}", actor.role.label()));

        let mut doc = Document {
            id: Uuid::new_v4(),
            sop_name: input.sop_name.trim().to_string(),
            document_code: code,
            document_number: input.document_number,
            version_number: version.to_string(),
            document_type: input.document_type,
            department: input.department.trim().to_string(),
            country: input.country,
            description: input.description,
            language: input.language,
            status: DocumentStatus::UnderReview,
            pending_with: None,
            upload_date: Some(input.upload_date.unwrap_or_else(|| now.date_naive())),
            last_revision_date: input.last_revision_date,
            next_revision_date: input.next_revision_date,
            review_start_date: input.review_start_date,
            review_deadline: input.review_deadline,
            effective_date: input.effective_date,
            created_at: now,
            updated_at: now,
            created_by: Some(actor.user_id.clone()),
            requester,
            document_owners: input.document_owners,
            reviewers: input.reviewers,
            document_creators: input.document_creators,
            compliance_contacts: input.compliance_contacts,
            current_reviewers: Vec::new(),
            comments: Vec::new(),
            audit_trail: Vec::new(),
            attachment_name: input.attachment_name,
            file_url: input.file_url,
        };
        let event = workflow::record(&mut doc, actor, AuditKind::Created, None, comment, now);
        Ok((doc, event))
    }

    /// Load a document the actor is allowed to see
    pub async fn get_document(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<Document, WorkflowError> {
        let doc = self.load_document(id).await?;
        if !capabilities::document_capabilities(&doc, actor).can_view {
            return Err(WorkflowError::forbidden(
                actor.role,
                format!("view document {}", id),
            ));
        }
        Ok(doc)
    }

    /// Documents visible to the actor.
    ///
    /// Deleted documents are listed only for admins who ask for them.
    pub async fn list_documents(
        &self,
        actor: &ActorContext,
        filter: &DocumentFilter,
    ) -> Result<Vec<Document>, WorkflowError> {
        let docs = self
            .documents
            .list(filter)
            .await
            .map_err(storage_error("list_documents"))?;

        let admin_with_deleted = actor.role == Role::Admin && filter.include_deleted;
        Ok(docs
            .into_iter()
            .filter(|doc| {
                is_visible_to(doc, actor)
                    || (admin_with_deleted && doc.status == DocumentStatus::Deleted)
            })
            .collect())
    }

    pub async fn document_capabilities(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<Capabilities, WorkflowError> {
        let doc = self.load_document(id).await?;
        Ok(capabilities::document_capabilities(&doc, actor))
    }

    /// Edit descriptive fields. On a live document the edit opens a change (`live-cr`).
    pub async fn update_document(
        &self,
        actor: &ActorContext,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<Document, WorkflowError> {
        if patch.is_empty() {
            return Err(WorkflowError::validation("body", "nothing to update"));
        }
        let current = self.load_document(id).await?;
        let action = WorkflowAction::Edit {
            requested: patch.status,
            note: patch.comment.clone(),
        };
        let plan = workflow::plan(&current, actor, &action)?;
        self.ensure_change_closes_with_request(&current, plan.target).await?;

        let mut doc = current.clone();
        validation::apply_patch(&mut doc, &patch, self.settings.revision_interval_months)?;
        let event = workflow::apply(&mut doc, actor, &plan, Utc::now());

        self.commit(doc, event, plan.notification).await
    }

    /// Run any workflow action
    pub async fn perform(
        &self,
        actor: &ActorContext,
        id: Uuid,
        action: WorkflowAction,
    ) -> Result<Document, WorkflowError> {
        let current = self.load_document(id).await?;
        let plan = workflow::plan(&current, actor, &action)?;
        self.ensure_change_closes_with_request(&current, plan.target).await?;

        let mut doc = current;
        let event = workflow::apply(&mut doc, actor, &plan, Utc::now());
        self.commit(doc, event, plan.notification).await
    }

    pub async fn take_action(
        &self,
        actor: &ActorContext,
        id: Uuid,
        forward_to: Option<Party>,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::TakeAction { forward_to, note })
            .await
    }

    pub async fn approve(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::Approve { note }).await
    }

    pub async fn reject(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: impl Into<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(
            actor,
            id,
            WorkflowAction::Reject {
                reason: reason.into(),
            },
        )
        .await
    }

    pub async fn query(
        &self,
        actor: &ActorContext,
        id: Uuid,
        text: impl Into<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::Query { text: text.into() })
            .await
    }

    pub async fn start_review(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::StartReview { note }).await
    }

    /// Move a revised document to its owners, storing the new file if one is given.
    ///
    /// A failed file store is logged and the transition still goes through.
    pub async fn upload_revision(
        &self,
        actor: &ActorContext,
        id: Uuid,
        attachment: Option<Attachment>,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        let current = self.load_document(id).await?;
        let plan = workflow::plan(&current, actor, &WorkflowAction::UploadRevision { note })?;

        let mut doc = current;
        if let Some(attachment) = attachment {
            match self.store_attachment(doc.id, &attachment).await {
                Ok(url) => {
                    doc.attachment_name = Some(attachment.file_name);
                    doc.file_url = Some(url);
                }
                Err(e) => {
                    tracing::warn!(document_id = %doc.id, error = %e, "revision file was not stored");
                }
            }
        }
        let event = workflow::apply(&mut doc, actor, &plan, Utc::now());
        self.commit(doc, event, plan.notification).await
    }

    pub async fn push_live(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::PushLive { note }).await
    }

    /// Return a `live-cr` document to `live`.
    ///
    /// A change opened by an approved change request is finished through that
    /// request, so the request closes and the version moves on.
    pub async fn complete_change(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        if let Some(cr) = self.approved_request_for(id).await? {
            self.complete_change_request(actor, cr.id, note).await?;
            return self.load_document(id).await;
        }
        self.perform(actor, id, WorkflowAction::CompleteChange { note })
            .await
    }

    pub async fn archive(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::Archive { reason }).await
    }

    /// Soft delete; the record stays with status `deleted`
    pub async fn delete(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::Delete { reason }).await
    }

    pub async fn transition(
        &self,
        actor: &ActorContext,
        id: Uuid,
        target: DocumentStatus,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.perform(actor, id, WorkflowAction::Transition { target, note })
            .await
    }

    /// Store a file and link it to the document. Store failures are returned.
    pub async fn attach_file(
        &self,
        actor: &ActorContext,
        id: Uuid,
        attachment: Attachment,
    ) -> Result<Document, WorkflowError> {
        let mut doc = self.load_document(id).await?;
        let caps = capabilities::document_capabilities(&doc, actor);
        if !(caps.can_edit || caps.can_upload_revision) {
            return Err(WorkflowError::forbidden(actor.role, "attach files to this document"));
        }

        let url = self.store_attachment(doc.id, &attachment).await.map_err(|e| {
            tracing::error!(document_id = %doc.id, error = %e, "attachment store failed");
            WorkflowError::Internal
        })?;
        let details = format!("File attached: {}", attachment.file_name);
        doc.attachment_name = Some(attachment.file_name);
        doc.file_url = Some(url);
        let status = doc.status;
        let event = workflow::record(&mut doc, actor, AuditKind::FileAttached, Some(status), details, Utc::now());

        self.commit(doc, event, None).await
    }

    /// Next free document code for a department, type and language
    pub async fn next_document_code(
        &self,
        department: &str,
        document_type: DocumentType,
        language: Option<Language>,
    ) -> Result<String, WorkflowError> {
        let all = DocumentFilter {
            include_deleted: true,
            ..DocumentFilter::default()
        };
        let existing = self
            .documents
            .list(&all)
            .await
            .map_err(storage_error("next_document_code"))?;
        generate_document_code(
            &self.settings.organization_code,
            department,
            document_type,
            language,
            existing.iter().map(|doc| doc.document_code.as_str()),
        )
    }

    // ===== Change Request Operations =====

    pub async fn create_change_request(
        &self,
        actor: &ActorContext,
        input: NewChangeRequest,
    ) -> Result<ChangeRequest, WorkflowError> {
        if !matches!(
            actor.role,
            Role::Requester | Role::DocumentOwner | Role::DocumentController | Role::Admin
        ) {
            return Err(WorkflowError::forbidden(actor.role, "raise change requests"));
        }

        let now = Utc::now();
        let mut cr = match input.request_type {
            RequestType::NewRequest => {
                require_text("document_name", &input.document_name)?;
                let department = input.department.clone().unwrap_or_default();
                require_text("department", &department)?;
                let approvers = if input.approvers.is_empty() {
                    self.settings
                        .approvers_for(&department)
                        .cloned()
                        .unwrap_or_default()
                } else {
                    input.approvers.clone()
                };
                ChangeRequest {
                    id: Uuid::new_v4(),
                    document_id: None,
                    document_name: input.document_name.trim().to_string(),
                    request_type: RequestType::NewRequest,
                    change_type: None,
                    status: ChangeRequestStatus::Pending,
                    requestor: actor.as_person(),
                    approvers,
                    department: Some(department.trim().to_string()),
                    description: input.description.clone(),
                    document_type: input.document_type,
                    language: input.language,
                    proposed_version: Version::INITIAL.to_string(),
                    comments: Vec::new(),
                    audit_trail: Vec::new(),
                    created_at: now,
                    updated_at: now,
                }
            }
            RequestType::ChangeRequest => {
                let document_id = input.document_id.ok_or_else(|| {
                    WorkflowError::validation("document_id", "change requests need a target document")
                })?;
                let change_type = input.change_type.ok_or_else(|| {
                    WorkflowError::validation("change_type", "change requests need a change type")
                })?;
                let target = self.load_document(document_id).await?;
                match target.status {
                    DocumentStatus::Live => {}
                    DocumentStatus::LiveCr => {
                        return Err(WorkflowError::Conflict {
                            reason: format!("document {} already has a change in progress", document_id),
                        })
                    }
                    other => {
                        return Err(WorkflowError::validation(
                            "document_id",
                            format!("document {} is '{}'; only live documents can be changed", document_id, other),
                        ))
                    }
                }
                if self.has_open_request_for(document_id).await? {
                    return Err(WorkflowError::Conflict {
                        reason: format!("document {} already has an open change request", document_id),
                    });
                }

                let proposed = self.proposed_version(&target, change_type).await?;
                let department = input
                    .department
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| target.department.clone());
                let approvers = if !input.approvers.is_empty() {
                    input.approvers.clone()
                } else if let Some(configured) = self.settings.approvers_for(&department) {
                    configured.clone()
                } else {
                    target.document_owners.clone()
                };
                let status = if target.document_owners.is_empty() {
                    ChangeRequestStatus::Pending
                } else {
                    ChangeRequestStatus::PendingOwnerApproval
                };

                ChangeRequest {
                    id: Uuid::new_v4(),
                    document_id: Some(document_id),
                    document_name: target.sop_name.clone(),
                    request_type: RequestType::ChangeRequest,
                    change_type: Some(change_type),
                    status,
                    requestor: actor.as_person(),
                    approvers,
                    department: Some(department),
                    description: input.description.clone(),
                    document_type: Some(target.document_type),
                    language: target.language,
                    proposed_version: proposed.to_string(),
                    comments: Vec::new(),
                    audit_trail: Vec::new(),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let summary = input
            .comment
            .or(input.description)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| cr.document_name.clone());
        let event = record_on_request(
            &mut cr,
            actor,
            AuditKind::ChangeRequested,
            format!("Requested: {}", summary),
            now,
        );

        let saved = self
            .change_requests
            .upsert(&cr)
            .await
            .map_err(storage_error("create_change_request"))?;
        tracing::info!(
            change_request_id = %saved.id,
            request_type = saved.request_type.as_str(),
            proposed_version = %saved.proposed_version,
            "change request created"
        );
        self.audit_request(&saved, &event).await;
        Ok(saved)
    }

    pub async fn get_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<ChangeRequest, WorkflowError> {
        let cr = self.load_change_request(id).await?;
        if !self.can_see_request(actor, &cr).await? {
            return Err(WorkflowError::forbidden(
                actor.role,
                format!("view change request {}", id),
            ));
        }
        Ok(cr)
    }

    /// Admins and controllers see every request; others see what they raised or must act on
    pub async fn list_change_requests(
        &self,
        actor: &ActorContext,
        filter: &ChangeRequestFilter,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        let all = self
            .change_requests
            .list(filter)
            .await
            .map_err(storage_error("list_change_requests"))?;

        let mut visible = Vec::with_capacity(all.len());
        for cr in all {
            if self.can_see_request(actor, &cr).await? {
                visible.push(cr);
            }
        }
        Ok(visible)
    }

    /// Approve a request.
    ///
    /// A change-request moves its live target into `live-cr`; a new-request
    /// creates its document.
    pub async fn approve_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let original = self.load_change_request(id).await?;
        self.ensure_decider(actor, &original, "approve this change request").await?;
        ensure_request_move(&original, ChangeRequestStatus::Approved)?;

        let now = Utc::now();
        let mut cr = original.clone();
        let staged = match cr.request_type {
            RequestType::ChangeRequest => {
                let document_id = cr
                    .document_id
                    .ok_or_else(|| WorkflowError::validation("document_id", "change request has no target document"))?;
                let target = self.load_document(document_id).await?;
                let plan = workflow::plan_change_request_approval(&target, actor, &cr)?;
                let mut doc = target;
                let event = workflow::apply(&mut doc, actor, &plan, now);
                StagedDocument {
                    doc,
                    event,
                    notification: plan.notification,
                }
            }
            RequestType::NewRequest => {
                let (doc, event) = self.document_from_request(actor, &cr).await?;
                cr.document_id = Some(doc.id);
                StagedDocument {
                    doc,
                    event,
                    notification: None,
                }
            }
        };

        cr.status = ChangeRequestStatus::Approved;
        let details = with_note(format!("Approved by {}", actor.role.label()), note);
        let event = record_on_request(&mut cr, actor, AuditKind::ChangeRequestApproved, details, now);
        self.commit_request_with_document(&original, cr, event, staged).await
    }

    pub async fn reject_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: impl Into<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let reason = reason.into();
        require_text("reason", &reason)?;
        let mut cr = self.load_change_request(id).await?;
        self.ensure_decider(actor, &cr, "reject this change request").await?;
        ensure_request_move(&cr, ChangeRequestStatus::Rejected)?;

        cr.status = ChangeRequestStatus::Rejected;
        let details = format!("Rejected: {}", reason.trim());
        let event = record_on_request(&mut cr, actor, AuditKind::ChangeRequestRejected, details, Utc::now());
        self.commit_request(cr, event).await
    }

    /// Ask a question on an open request; status is unchanged
    pub async fn query_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        text: impl Into<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let text = text.into();
        require_text("query", &text)?;
        let mut cr = self.load_change_request(id).await?;
        let involved = matches!(actor.role, Role::Admin | Role::DocumentController)
            || actor.is(&cr.requestor)
            || cr.approvers.iter().any(|p| actor.is(p));
        if !involved {
            return Err(WorkflowError::forbidden(actor.role, "query this change request"));
        }
        if !cr.status.is_open() {
            return Err(WorkflowError::Conflict {
                reason: format!("change request {} is '{}'", cr.id, cr.status),
            });
        }

        let details = format!("Query: {}", text.trim());
        let event = record_on_request(&mut cr, actor, AuditKind::ChangeRequestQueried, details, Utc::now());
        self.commit_request(cr, event).await
    }

    /// Withdraw an open request. Only its requestor may do this.
    pub async fn cancel_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: impl Into<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let reason = reason.into();
        require_text("reason", &reason)?;
        let mut cr = self.load_change_request(id).await?;
        if !actor.is(&cr.requestor) {
            return Err(WorkflowError::forbidden(actor.role, "cancel someone else's change request"));
        }
        ensure_request_move(&cr, ChangeRequestStatus::Rejected)?;

        cr.status = ChangeRequestStatus::Rejected;
        let details = format!("Cancelled: {}", reason.trim());
        let event = record_on_request(&mut cr, actor, AuditKind::ChangeRequestCancelled, details, Utc::now());
        self.commit_request(cr, event).await
    }

    /// Finish an approved request: the target returns to `live` at the proposed version
    pub async fn complete_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let original = self.load_change_request(id).await?;
        let target = match original.document_id {
            Some(document_id) => Some(self.load_document(document_id).await?),
            None => None,
        };
        let owns_target = target
            .as_ref()
            .is_some_and(|doc| doc.document_owners.iter().any(|p| actor.is(p)));
        if !(matches!(actor.role, Role::Admin | Role::DocumentController) || owns_target) {
            return Err(WorkflowError::forbidden(actor.role, "complete this change request"));
        }
        ensure_request_move(&original, ChangeRequestStatus::Completed)?;

        let now = Utc::now();
        let staged = match (original.request_type, target) {
            (RequestType::ChangeRequest, Some(target)) => {
                let plan = workflow::plan_change_request_completion(&target, actor, &original)?;
                let mut doc = target;
                let today = now.date_naive();
                doc.version_number = Version::parse(&original.proposed_version)?.to_string();
                doc.last_revision_date = Some(today);
                doc.next_revision_date =
                    Some(earliest_next_revision(today, self.settings.revision_interval_months)?);
                let event = workflow::apply(&mut doc, actor, &plan, now);
                Some(StagedDocument {
                    doc,
                    event,
                    notification: plan.notification,
                })
            }
            _ => None,
        };

        let mut cr = original.clone();
        cr.status = ChangeRequestStatus::Completed;
        let details = with_note(format!("Completed by {}", actor.role.label()), note);
        let event = record_on_request(&mut cr, actor, AuditKind::ChangeRequestCompleted, details, now);
        match staged {
            Some(staged) => self.commit_request_with_document(&original, cr, event, staged).await,
            None => self.commit_request(cr, event).await,
        }
    }

    // ===== Helper Methods =====

    async fn load_document(&self, id: Uuid) -> Result<Document, WorkflowError> {
        self.documents
            .get(id)
            .await
            .map_err(storage_error("get_document"))?
            .ok_or_else(|| WorkflowError::document_not_found(id))
    }

    async fn load_change_request(&self, id: Uuid) -> Result<ChangeRequest, WorkflowError> {
        self.change_requests
            .get(id)
            .await
            .map_err(storage_error("get_change_request"))?
            .ok_or_else(|| WorkflowError::change_request_not_found(id))
    }

    async fn save_document(&self, doc: &Document, operation: &'static str) -> Result<Document, WorkflowError> {
        self.documents
            .upsert(doc)
            .await
            .map_err(storage_error(operation))
    }

    async fn save_request(&self, cr: &ChangeRequest) -> Result<ChangeRequest, WorkflowError> {
        self.change_requests
            .upsert(cr)
            .await
            .map_err(storage_error("save_change_request"))
    }

    /// Store the document, then notify and audit
    async fn commit(
        &self,
        doc: Document,
        event: AuditEvent,
        notification: Option<Notification>,
    ) -> Result<Document, WorkflowError> {
        let saved = self.save_document(&doc, "save_document").await?;
        self.announce_document(&saved, &event, notification).await;
        Ok(saved)
    }

    async fn announce_document(
        &self,
        saved: &Document,
        event: &AuditEvent,
        notification: Option<Notification>,
    ) {
        tracing::info!(
            document_id = %saved.id,
            action = event.kind.as_str(),
            from = ?event.from_status.map(|s| s.as_str()),
            to = saved.status.as_str(),
            pending_with = ?saved.pending_with.as_ref().map(|p| p.label().to_string()),
            actor = %event.actor_id,
            "document workflow action"
        );

        if let Some(notification) = notification {
            self.dispatch(saved, notification).await;
        }
        self.audit_document(saved, event).await;
    }

    async fn commit_request(
        &self,
        cr: ChangeRequest,
        event: AuditEvent,
    ) -> Result<ChangeRequest, WorkflowError> {
        let saved = self.save_request(&cr).await?;
        self.announce_request(&saved, &event).await;
        Ok(saved)
    }

    /// Store a request together with the document it changes.
    ///
    /// The request is written first. If the document write then fails the
    /// request is put back as it was, so neither change is left behind.
    async fn commit_request_with_document(
        &self,
        original: &ChangeRequest,
        cr: ChangeRequest,
        event: AuditEvent,
        staged: StagedDocument,
    ) -> Result<ChangeRequest, WorkflowError> {
        let saved_request = self.save_request(&cr).await?;
        let saved_doc = match self.save_document(&staged.doc, "save_document").await {
            Ok(doc) => doc,
            Err(e) => {
                if let Err(restore) = self.change_requests.upsert(original).await {
                    tracing::error!(
                        change_request_id = %original.id,
                        error = %restore,
                        "could not restore change request after failed document save"
                    );
                }
                return Err(e);
            }
        };

        self.announce_document(&saved_doc, &staged.event, staged.notification).await;
        self.announce_request(&saved_request, &event).await;
        Ok(saved_request)
    }

    async fn announce_request(&self, saved: &ChangeRequest, event: &AuditEvent) {
        tracing::info!(
            change_request_id = %saved.id,
            action = event.kind.as_str(),
            status = saved.status.as_str(),
            actor = %event.actor_id,
            "change request action"
        );
        self.audit_request(saved, event).await;
    }

    /// Call the notification hook; failures never roll back the change
    async fn dispatch(&self, doc: &Document, notification: Notification) {
        let hook = match &notification {
            Notification::DocumentLive => "notify_document_live",
            Notification::Review(_) => "send_review_notifications",
            Notification::OwnerForApproval => "notify_document_owner_for_approval",
            Notification::ControllerQuery(_) => "notify_document_controller_query",
            Notification::Rejection(_) => "send_review_rejection_notifications",
            Notification::Approved => "notify_document_approved",
            Notification::Retired => "notify_document_retired",
        };
        let result = match &notification {
            Notification::DocumentLive => self.notifier.notify_document_live(doc).await,
            Notification::Review(recipients) => {
                self.notifier.send_review_notifications(doc, recipients).await
            }
            Notification::OwnerForApproval => {
                self.notifier.notify_document_owner_for_approval(doc).await
            }
            Notification::ControllerQuery(query) => {
                self.notifier.notify_document_controller_query(doc, query).await
            }
            Notification::Rejection(reason) => {
                self.notifier
                    .send_review_rejection_notifications(doc, reason)
                    .await
            }
            Notification::Approved => self.notifier.notify_document_approved(doc).await,
            Notification::Retired => self.notifier.notify_document_retired(doc).await,
        };
        if let Err(e) = result {
            tracing::warn!(document_id = %doc.id, hook, error = %e, "notification failed");
        }
    }

    async fn audit_document(&self, doc: &Document, event: &AuditEvent) {
        if let Err(e) = self.audit.record(AuditRecord::for_document(doc, event)).await {
            tracing::warn!(document_id = %doc.id, error = %e, "audit sink failed");
        }
    }

    async fn audit_request(&self, cr: &ChangeRequest, event: &AuditEvent) {
        if let Err(e) = self
            .audit
            .record(AuditRecord::for_change_request(cr, event))
            .await
        {
            tracing::warn!(change_request_id = %cr.id, error = %e, "audit sink failed");
        }
    }

    async fn store_attachment(&self, document_id: Uuid, attachment: &Attachment) -> anyhow::Result<String> {
        let path = attachment_path(document_id, &attachment.file_name)
            .ok_or_else(|| anyhow::anyhow!("invalid attachment name '{}'", attachment.file_name))?;
        self.files.store(&path, &attachment.bytes).await
    }

    /// Version law over every document sharing the target's name
    async fn proposed_version(
        &self,
        target: &Document,
        change_type: crate::contract::ChangeType,
    ) -> Result<Version, WorkflowError> {
        let all = DocumentFilter {
            include_deleted: true,
            ..DocumentFilter::default()
        };
        let docs = self
            .documents
            .list(&all)
            .await
            .map_err(storage_error("proposed_version"))?;
        let versions = docs
            .iter()
            .filter(|doc| doc.id == target.id || doc.sop_name.eq_ignore_ascii_case(&target.sop_name))
            .map(|doc| doc.version_number.as_str());
        next_version(RequestType::ChangeRequest, Some(change_type), versions)
    }

    async fn has_open_request_for(&self, document_id: Uuid) -> Result<bool, WorkflowError> {
        let filter = ChangeRequestFilter {
            document_id: Some(document_id),
            ..ChangeRequestFilter::default()
        };
        let requests = self
            .change_requests
            .list(&filter)
            .await
            .map_err(storage_error("list_change_requests"))?;
        Ok(requests
            .iter()
            .any(|cr| cr.status.is_open() || cr.status == ChangeRequestStatus::Approved))
    }

    async fn approved_request_for(&self, document_id: Uuid) -> Result<Option<ChangeRequest>, WorkflowError> {
        let filter = ChangeRequestFilter {
            document_id: Some(document_id),
            status: Some(ChangeRequestStatus::Approved),
        };
        let requests = self
            .change_requests
            .list(&filter)
            .await
            .map_err(storage_error("list_change_requests"))?;
        Ok(requests.into_iter().next())
    }

    /// A `live-cr` document held by an approved request leaves only through that request
    async fn ensure_change_closes_with_request(
        &self,
        doc: &Document,
        target: DocumentStatus,
    ) -> Result<(), WorkflowError> {
        if doc.status != DocumentStatus::LiveCr || target == DocumentStatus::LiveCr {
            return Ok(());
        }
        match self.approved_request_for(doc.id).await? {
            Some(cr) => Err(WorkflowError::Conflict {
                reason: format!(
                    "document {} is held by approved change request {}; complete it there",
                    doc.id, cr.id
                ),
            }),
            None => Ok(()),
        }
    }

    async fn owns_target(&self, actor: &ActorContext, cr: &ChangeRequest) -> Result<bool, WorkflowError> {
        let Some(document_id) = cr.document_id else {
            return Ok(false);
        };
        let owned = self
            .documents
            .get(document_id)
            .await
            .map_err(storage_error("get_document"))?
            .is_some_and(|doc| doc.document_owners.iter().any(|p| actor.is(p)));
        Ok(owned)
    }

    async fn can_see_request(&self, actor: &ActorContext, cr: &ChangeRequest) -> Result<bool, WorkflowError> {
        if matches!(actor.role, Role::Admin | Role::DocumentController)
            || actor.is(&cr.requestor)
            || cr.approvers.iter().any(|p| actor.is(p))
        {
            return Ok(true);
        }
        self.owns_target(actor, cr).await
    }

    /// Who may approve or reject depends on the request's stage
    async fn ensure_decider(
        &self,
        actor: &ActorContext,
        cr: &ChangeRequest,
        action: &str,
    ) -> Result<(), WorkflowError> {
        let allowed = match cr.status {
            ChangeRequestStatus::PendingOwnerApproval => {
                actor.role == Role::Admin || self.owns_target(actor, cr).await?
            }
            _ => {
                matches!(actor.role, Role::Admin | Role::DocumentController)
                    || cr.approvers.iter().any(|p| actor.is(p))
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(WorkflowError::forbidden(actor.role, action))
        }
    }

    /// Build the document an approved new-request asks for.
    ///
    /// The approver list already authorised the caller, so the creator role
    /// gate of `create_document` does not apply.
    async fn document_from_request(
        &self,
        actor: &ActorContext,
        cr: &ChangeRequest,
    ) -> Result<(Document, AuditEvent), WorkflowError> {
        let department = cr.department.clone().unwrap_or_default();
        let owners = match self.settings.approvers_for(&department) {
            Some(configured) => configured.clone(),
            None if !cr.approvers.is_empty() => cr.approvers.clone(),
            None => vec![actor.as_person()],
        };
        let mut input = NewDocument::new(
            cr.document_name.clone(),
            cr.document_type.unwrap_or(DocumentType::Sop),
            department,
        );
        input.language = cr.language;
        input.description = cr.description.clone();
        input.requester = Some(cr.requestor.clone());
        input.document_owners = owners;
        input.comment = Some(format!("Created from change request {}", cr.id));
        self.prepare_document(actor, input).await
    }
}

/// A document change computed but not yet stored
struct StagedDocument {
    doc: Document,
    event: AuditEvent,
    notification: Option<Notification>,
}

fn ensure_request_move(cr: &ChangeRequest, target: ChangeRequestStatus) -> Result<(), WorkflowError> {
    if cr.status.can_transition(target) {
        Ok(())
    } else {
        Err(WorkflowError::Conflict {
            reason: format!(
                "change request {} is '{}' and cannot become '{}'",
                cr.id, cr.status, target
            ),
        })
    }
}

fn with_note(base: String, note: Option<String>) -> String {
    match note.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => format!("{}: {}", base, note),
        _ => base,
    }
}

/// Append one comment and one audit event to a change request
fn record_on_request(
    cr: &mut ChangeRequest,
    actor: &ActorContext,
    kind: AuditKind,
    details: String,
    now: DateTime<Utc>,
) -> AuditEvent {
    let event = AuditEvent {
        kind,
        actor_role: actor.role,
        actor_id: actor.user_id.clone(),
        from_status: None,
        to_status: None,
        pending_with: None,
        details: details.clone(),
        timestamp: now,
    };
    cr.comments.push(details);
    cr.audit_trail.push(event.clone());
    cr.updated_at = now;
    event
}
