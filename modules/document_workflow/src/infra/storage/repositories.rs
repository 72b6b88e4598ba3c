//! SeaORM repository implementations

use crate::contract::{
    ChangeRequest, ChangeRequestFilter, Document, DocumentFilter, DocumentStatus,
};
use crate::domain::repository::{ChangeRequestRepository, DocumentRepository};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use super::entity::{change_request, document};

// ===== Document Repository =====

pub struct SeaOrmDocumentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmDocumentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for SeaOrmDocumentRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Document>> {
        document::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Document::try_from)
            .transpose()
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let mut query = document::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(document::Column::Status.eq(status.as_str()));
        } else if !filter.include_deleted {
            query = query.filter(document::Column::Status.ne(DocumentStatus::Deleted.as_str()));
        }
        if let Some(department) = &filter.department {
            query = query.filter(document::Column::Department.eq(department.as_str()));
        }
        if let Some(document_type) = filter.document_type {
            query = query.filter(document::Column::DocumentType.eq(document_type.label()));
        }
        if let Some(name) = &filter.sop_name {
            query = query.filter(document::Column::SopName.contains(name.as_str()));
        }

        let rows = query
            .order_by_desc(document::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn upsert(&self, doc: &Document) -> Result<Document> {
        let active = document::ActiveModel::try_from(doc)?;

        // Full-row replace without a version check: last write wins
        let existing = document::Entity::find_by_id(doc.id).one(&*self.db).await?;
        if existing.is_some() {
            document::Entity::update(active).exec(&*self.db).await?;
        } else {
            document::Entity::insert(active).exec(&*self.db).await?;
        }

        Ok(doc.clone())
    }
}

// ===== Change Request Repository =====

pub struct SeaOrmChangeRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmChangeRequestRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChangeRequestRepository for SeaOrmChangeRequestRepository {
    async fn get(&self, id: Uuid) -> Result<Option<ChangeRequest>> {
        change_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(ChangeRequest::try_from)
            .transpose()
    }

    async fn list(&self, filter: &ChangeRequestFilter) -> Result<Vec<ChangeRequest>> {
        let mut query = change_request::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(change_request::Column::Status.eq(status.as_str()));
        }
        if let Some(document_id) = filter.document_id {
            query = query.filter(change_request::Column::DocumentId.eq(document_id));
        }

        let rows = query
            .order_by_desc(change_request::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        rows.into_iter().map(ChangeRequest::try_from).collect()
    }

    async fn upsert(&self, cr: &ChangeRequest) -> Result<ChangeRequest> {
        let active = change_request::ActiveModel::try_from(cr)?;

        let existing = change_request::Entity::find_by_id(cr.id)
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            change_request::Entity::update(active).exec(&*self.db).await?;
        } else {
            change_request::Entity::insert(active).exec(&*self.db).await?;
        }

        Ok(cr.clone())
    }
}
