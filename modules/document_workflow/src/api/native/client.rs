//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    ActorContext, Capabilities, ChangeRequest, ChangeRequestFilter, Document, DocumentFilter,
    DocumentPatch, DocumentStatus, DocumentWorkflowApi, NewChangeRequest, NewDocument, Party,
    WorkflowError,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DocumentWorkflowApi for NativeClient {
    async fn create_document(
        &self,
        actor: &ActorContext,
        input: NewDocument,
    ) -> Result<Document, WorkflowError> {
        self.service.create_document(actor, input).await
    }

    async fn get_document(&self, actor: &ActorContext, id: Uuid) -> Result<Document, WorkflowError> {
        self.service.get_document(actor, id).await
    }

    async fn list_documents(
        &self,
        actor: &ActorContext,
        filter: DocumentFilter,
    ) -> Result<Vec<Document>, WorkflowError> {
        self.service.list_documents(actor, &filter).await
    }

    async fn document_capabilities(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<Capabilities, WorkflowError> {
        self.service.document_capabilities(actor, id).await
    }

    async fn update_document(
        &self,
        actor: &ActorContext,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<Document, WorkflowError> {
        self.service.update_document(actor, id, patch).await
    }

    async fn take_action(
        &self,
        actor: &ActorContext,
        id: Uuid,
        forward_to: Option<Party>,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.service.take_action(actor, id, forward_to, note).await
    }

    async fn approve(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.service.approve(actor, id, note).await
    }

    async fn reject(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: String,
    ) -> Result<Document, WorkflowError> {
        self.service.reject(actor, id, reason).await
    }

    async fn query(
        &self,
        actor: &ActorContext,
        id: Uuid,
        text: String,
    ) -> Result<Document, WorkflowError> {
        self.service.query(actor, id, text).await
    }

    async fn push_live(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.service.push_live(actor, id, note).await
    }

    async fn transition(
        &self,
        actor: &ActorContext,
        id: Uuid,
        target: DocumentStatus,
        note: Option<String>,
    ) -> Result<Document, WorkflowError> {
        self.service.transition(actor, id, target, note).await
    }

    async fn create_change_request(
        &self,
        actor: &ActorContext,
        input: NewChangeRequest,
    ) -> Result<ChangeRequest, WorkflowError> {
        self.service.create_change_request(actor, input).await
    }

    async fn list_change_requests(
        &self,
        actor: &ActorContext,
        filter: ChangeRequestFilter,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        self.service.list_change_requests(actor, &filter).await
    }

    async fn approve_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        self.service.approve_change_request(actor, id, note).await
    }

    async fn complete_change_request(
        &self,
        actor: &ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> Result<ChangeRequest, WorkflowError> {
        self.service.complete_change_request(actor, id, note).await
    }
}
