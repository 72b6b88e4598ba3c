/// Outbound side effects of the document workflow
///
/// Two collaborator traits sit here:
/// - `Notifier`: one hook per change of the party a document is pending with
/// - `AuditSink`: receives a record for every state change
///
/// Failures of either are logged by the service and never roll back the
/// mutation that triggered them.

use crate::contract::{AuditEvent, AuditKind, ChangeRequest, Document, Person, Role};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Notification hooks called by the workflow
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Document went live (push-live, change completed)
    async fn notify_document_live(&self, doc: &Document) -> anyhow::Result<()>;

    /// Document waits on the given reviewers, creators or requester
    async fn send_review_notifications(
        &self,
        doc: &Document,
        recipients: &[Person],
    ) -> anyhow::Result<()>;

    /// Document waits on its owners (revision uploaded, live edit)
    async fn notify_document_owner_for_approval(&self, doc: &Document) -> anyhow::Result<()>;

    /// A query was raised on the document
    async fn notify_document_controller_query(
        &self,
        doc: &Document,
        query: &str,
    ) -> anyhow::Result<()>;

    /// A review step was rejected
    async fn send_review_rejection_notifications(
        &self,
        doc: &Document,
        reason: &str,
    ) -> anyhow::Result<()>;

    /// Document reached `approved` and waits on the controller
    async fn notify_document_approved(&self, doc: &Document) -> anyhow::Result<()>;

    /// Document was archived or deleted
    async fn notify_document_retired(&self, doc: &Document) -> anyhow::Result<()>;
}

/// No-op notifier for testing or when notifications are disabled
pub struct NoOpNotifier;

#[async_trait::async_trait]
impl Notifier for NoOpNotifier {
    async fn notify_document_live(&self, _doc: &Document) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_review_notifications(
        &self,
        _doc: &Document,
        _recipients: &[Person],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn notify_document_owner_for_approval(&self, _doc: &Document) -> anyhow::Result<()> {
        Ok(())
    }

    async fn notify_document_controller_query(
        &self,
        _doc: &Document,
        _query: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_review_rejection_notifications(
        &self,
        _doc: &Document,
        _reason: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn notify_document_approved(&self, _doc: &Document) -> anyhow::Result<()> {
        Ok(())
    }

    async fn notify_document_retired(&self, _doc: &Document) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Record handed to the audit sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub document_id: Option<Uuid>,
    pub change_request_id: Option<Uuid>,
    pub action: AuditKind,
    pub actor_role: Role,
    pub actor_id: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Record for an event appended to a document's trail
    pub fn for_document(doc: &Document, event: &AuditEvent) -> Self {
        Self {
            document_id: Some(doc.id),
            change_request_id: None,
            action: event.kind,
            actor_role: event.actor_role,
            actor_id: event.actor_id.clone(),
            details: event.details.clone(),
            timestamp: event.timestamp,
        }
    }

    /// Record for an event appended to a change request's trail
    pub fn for_change_request(cr: &ChangeRequest, event: &AuditEvent) -> Self {
        Self {
            document_id: cr.document_id,
            change_request_id: Some(cr.id),
            action: event.kind,
            actor_role: event.actor_role,
            actor_id: event.actor_id.clone(),
            details: event.details.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// External audit log
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> anyhow::Result<()>;
}

pub struct NoOpAuditSink;

#[async_trait::async_trait]
impl AuditSink for NoOpAuditSink {
    async fn record(&self, _record: AuditRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DocumentStatus, Party};
    use chrono::Utc;

    fn event(kind: AuditKind) -> AuditEvent {
        AuditEvent {
            kind,
            actor_role: Role::Reviewer,
            actor_id: "rev-1".to_string(),
            from_status: Some(DocumentStatus::UnderReview),
            to_status: Some(DocumentStatus::PendingCreatorApproval),
            pending_with: Some(Party::DocumentCreator),
            details: "Approved by Reviewer".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_change_request_record_links_target_document() {
        let target = Uuid::new_v4();
        let cr = ChangeRequest {
            id: Uuid::new_v4(),
            document_id: Some(target),
            document_name: "Cash Handling".to_string(),
            request_type: crate::contract::RequestType::ChangeRequest,
            change_type: Some(crate::contract::ChangeType::Minor),
            status: crate::contract::ChangeRequestStatus::Pending,
            requestor: Person::new("req", "Rae", "rae@example.com"),
            approvers: Vec::new(),
            department: None,
            description: None,
            document_type: None,
            language: None,
            proposed_version: "1.1".to_string(),
            comments: Vec::new(),
            audit_trail: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record = AuditRecord::for_change_request(&cr, &event(AuditKind::ChangeRequested));
        assert_eq!(record.document_id, Some(target));
        assert_eq!(record.change_request_id, Some(cr.id));
        assert_eq!(record.action, AuditKind::ChangeRequested);
    }

    #[tokio::test]
    async fn test_noop_collaborators() {
        let sink = NoOpAuditSink;
        let record = AuditRecord {
            document_id: Some(Uuid::new_v4()),
            change_request_id: None,
            action: AuditKind::Approved,
            actor_role: Role::Reviewer,
            actor_id: "rev-1".to_string(),
            details: String::new(),
            timestamp: Utc::now(),
        };

        // Should not error
        assert!(sink.record(record).await.is_ok());
    }
}
