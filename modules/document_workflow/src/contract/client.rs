//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to drive the document workflow.
//! NO HTTP - direct function calls for performance.

use super::{
    error::WorkflowError,
    model::{
        ActorContext, Capabilities, ChangeRequest, ChangeRequestFilter, Document, DocumentFilter,
        DocumentPatch, DocumentStatus, NewChangeRequest, NewDocument, Party,
    },
};
use async_trait::async_trait;
use uuid::Uuid;

/// Document workflow API for inter-module communication
#[async_trait]
pub trait DocumentWorkflowApi: Send + Sync {
    // ===== Document Operations =====

    async fn create_document(
        &self,
        actor: &ActorContext,
        input: NewDocument,
    ) -> Result<Document, WorkflowError>;

    async fn get_document(&self, actor: &ActorContext, id: Uuid) -> Result<Document, WorkflowError>;

    /// Documents visible to the actor
    async fn list_documents(
        &self,
        actor: &ActorContext,
        filter: DocumentFilter,
    ) -> Result<Vec<Document>, WorkflowError>;

    async fn document_capabilities(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<Capabilities, WorkflowError>;

    async fn update_document(
        &self,
        actor: &ActorContext,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<Document, WorkflowError>;

    async fn take_action(
        &self,
        actor: &ActorContext,
        id: Uuid,
        forward_to: Option<Party>,
        note: Option<String>,
    ) -> Result<Document, WorkflowError>;

    async fn approve(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError>;

    async fn reject(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: String,
    ) -> Result<Document, WorkflowError>;

    async fn query(
        &self,
        actor: &ActorContext,
        id: Uuid,
        text: String,
    ) -> Result<Document, WorkflowError>;

    async fn push_live(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError>;

    /// Move a document along the transition table
    async fn transition(
        &self,
        actor: &ActorContext,
        id: Uuid,
        target: DocumentStatus,
        note: Option<String>,
    ) -> Result<Document, WorkflowError>;

    // ===== Change Request Operations =====

    async fn create_change_request(
        &self,
        actor: &ActorContext,
        input: NewChangeRequest,
    ) -> Result<ChangeRequest, WorkflowError>;

    async fn list_change_requests(
        &self,
        actor: &ActorContext,
        filter: ChangeRequestFilter,
    ) -> Result<Vec<ChangeRequest>, WorkflowError>;

    async fn approve_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError>;

    async fn complete_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError>;
}
