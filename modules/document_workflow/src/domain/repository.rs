//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{ChangeRequest, ChangeRequestFilter, Document, DocumentFilter};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for documents
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Find a document by id, deleted ones included
    async fn get(&self, id: Uuid) -> Result<Option<Document>>;

    /// List documents matching the filter, newest first
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>>;

    /// Create or fully replace a document. Last write wins.
    async fn upsert(&self, doc: &Document) -> Result<Document>;
}

/// Repository for change requests
#[async_trait]
pub trait ChangeRequestRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<ChangeRequest>>;

    /// List change requests matching the filter, newest first
    async fn list(&self, filter: &ChangeRequestFilter) -> Result<Vec<ChangeRequest>>;

    /// Create or fully replace a change request. Last write wins.
    async fn upsert(&self, cr: &ChangeRequest) -> Result<ChangeRequest>;
}
