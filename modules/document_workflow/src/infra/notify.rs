//! Logging adapters for notifications and audit
//!
//! Email delivery lives outside this service; these adapters emit structured
//! log records that a mail relay or log pipeline can pick up.

use crate::domain::events::{AuditRecord, AuditSink, Notifier};
use crate::contract::{Document, Person};
use async_trait::async_trait;

fn addresses(people: &[Person]) -> String {
    people
        .iter()
        .map(|p| if p.email.is_empty() { p.id.as_str() } else { p.email.as_str() })
        .collect::<Vec<_>>()
        .join(",")
}

/// Notifier that writes one `info` record per hook
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify_document_live(&self, doc: &Document) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            document_code = %doc.document_code,
            recipients = %addresses(&doc.stakeholders()),
            "document is live"
        );
        Ok(())
    }

    async fn send_review_notifications(
        &self,
        doc: &Document,
        recipients: &[Person],
    ) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            status = doc.status.as_str(),
            recipients = %addresses(recipients),
            "review requested"
        );
        Ok(())
    }

    async fn notify_document_owner_for_approval(&self, doc: &Document) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            status = doc.status.as_str(),
            recipients = %addresses(&doc.document_owners),
            "owner approval requested"
        );
        Ok(())
    }

    async fn notify_document_controller_query(
        &self,
        doc: &Document,
        query: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            pending_with = ?doc.pending_with.as_ref().map(|p| p.label().to_string()),
            query,
            "query raised"
        );
        Ok(())
    }

    async fn send_review_rejection_notifications(
        &self,
        doc: &Document,
        reason: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            status = doc.status.as_str(),
            reason,
            "review rejected"
        );
        Ok(())
    }

    async fn notify_document_approved(&self, doc: &Document) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            document_code = %doc.document_code,
            "document approved, waiting to go live"
        );
        Ok(())
    }

    async fn notify_document_retired(&self, doc: &Document) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::notify",
            document_id = %doc.id,
            status = doc.status.as_str(),
            recipients = %addresses(&doc.stakeholders()),
            "document retired"
        );
        Ok(())
    }
}

/// Audit sink that writes each record to the `docflow::audit` target
pub struct LoggingAuditSink;

#[async_trait]
impl AuditSink for LoggingAuditSink {
    async fn record(&self, record: AuditRecord) -> anyhow::Result<()> {
        tracing::info!(
            target: "docflow::audit",
            document_id = ?record.document_id,
            change_request_id = ?record.change_request_id,
            action = record.action.as_str(),
            actor_role = record.actor_role.as_str(),
            actor_id = %record.actor_id,
            timestamp = %record.timestamp,
            details = %record.details,
            "audit"
        );
        Ok(())
    }
}
