//! Common test utilities: in-memory repositories, recording collaborators and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use document_workflow::contract::*;
use document_workflow::domain::repository::{ChangeRequestRepository, DocumentRepository};
use document_workflow::domain::{AuditRecord, AuditSink, FileStore, Notifier, Service, ServiceSettings};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

pub fn print_stage(doc: &Document, stage: &str) {
    println!(
        "   ➡️  {}: status={} pending_with={}",
        stage,
        doc.status,
        doc.pending_with
            .as_ref()
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| "none".to_string())
    );
}

// ===== Mock repositories =====

#[derive(Default)]
pub struct MockDocumentRepo {
    data: RwLock<HashMap<Uuid, Document>>,
    fail_writes: AtomicBool,
}

impl MockDocumentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upsert fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self, id: Uuid) -> Option<Document> {
        self.data.read().get(&id).cloned()
    }

    /// Put a document straight into the store, bypassing the workflow
    pub fn seed(&self, doc: Document) {
        self.data.write().insert(doc.id, doc);
    }

    pub fn print_state(&self, context: &str) {
        let data = self.data.read();
        println!("\n========== DocumentRepository State: {} ==========", context);
        println!("Total documents: {}", data.len());
        for doc in data.values() {
            println!(
                "  • {} [{}] status={} v{}",
                doc.document_code, doc.sop_name, doc.status, doc.version_number
            );
        }
    }
}

#[async_trait]
impl DocumentRepository for MockDocumentRepo {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Document>> {
        Ok(self.data.read().get(&id).cloned())
    }

    async fn list(&self, filter: &DocumentFilter) -> anyhow::Result<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .data
            .read()
            .values()
            .filter(|doc| match filter.status {
                Some(status) => doc.status == status,
                None => filter.include_deleted || doc.status != DocumentStatus::Deleted,
            })
            .filter(|doc| {
                filter
                    .department
                    .as_ref()
                    .is_none_or(|d| &doc.department == d)
            })
            .filter(|doc| filter.document_type.is_none_or(|t| doc.document_type == t))
            .filter(|doc| {
                filter
                    .sop_name
                    .as_ref()
                    .is_none_or(|name| doc.sop_name.contains(name.as_str()))
            })
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn upsert(&self, doc: &Document) -> anyhow::Result<Document> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.data.write().insert(doc.id, doc.clone());
        Ok(doc.clone())
    }
}

#[derive(Default)]
pub struct MockChangeRequestRepo {
    data: RwLock<HashMap<Uuid, ChangeRequest>>,
    fail_writes: AtomicBool,
}

impl MockChangeRequestRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upsert fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self, id: Uuid) -> Option<ChangeRequest> {
        self.data.read().get(&id).cloned()
    }
}

#[async_trait]
impl ChangeRequestRepository for MockChangeRequestRepo {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<ChangeRequest>> {
        Ok(self.data.read().get(&id).cloned())
    }

    async fn list(&self, filter: &ChangeRequestFilter) -> anyhow::Result<Vec<ChangeRequest>> {
        let mut requests: Vec<ChangeRequest> = self
            .data
            .read()
            .values()
            .filter(|cr| filter.status.is_none_or(|s| cr.status == s))
            .filter(|cr| filter.document_id.is_none_or(|id| cr.document_id == Some(id)))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn upsert(&self, cr: &ChangeRequest) -> anyhow::Result<ChangeRequest> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        self.data.write().insert(cr.id, cr.clone());
        Ok(cr.clone())
    }
}

// ===== Collaborators =====

/// Records the name of every hook called
#[derive(Default)]
pub struct RecordingNotifier {
    calls: RwLock<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls but return an error from each of them
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    fn hit(&self, hook: &str) -> anyhow::Result<()> {
        self.calls.write().push(hook.to_string());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp relay unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_document_live(&self, _doc: &Document) -> anyhow::Result<()> {
        self.hit("notify_document_live")
    }

    async fn send_review_notifications(
        &self,
        _doc: &Document,
        _recipients: &[Person],
    ) -> anyhow::Result<()> {
        self.hit("send_review_notifications")
    }

    async fn notify_document_owner_for_approval(&self, _doc: &Document) -> anyhow::Result<()> {
        self.hit("notify_document_owner_for_approval")
    }

    async fn notify_document_controller_query(
        &self,
        _doc: &Document,
        _query: &str,
    ) -> anyhow::Result<()> {
        self.hit("notify_document_controller_query")
    }

    async fn send_review_rejection_notifications(
        &self,
        _doc: &Document,
        _reason: &str,
    ) -> anyhow::Result<()> {
        self.hit("send_review_rejection_notifications")
    }

    async fn notify_document_approved(&self, _doc: &Document) -> anyhow::Result<()> {
        self.hit("notify_document_approved")
    }

    async fn notify_document_retired(&self, _doc: &Document) -> anyhow::Result<()> {
        self.hit("notify_document_retired")
    }
}

#[derive(Default)]
pub struct RecordingAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, record: AuditRecord) -> anyhow::Result<()> {
        self.records.write().push(record);
        Ok(())
    }
}

/// Keeps stored files in memory; can be told to fail
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
    fail: AtomicBool,
}

impl MemoryFileStore {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn store(&self, logical_path: &str, bytes: &[u8]) -> anyhow::Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("bucket unavailable");
        }
        self.files
            .write()
            .insert(logical_path.to_string(), bytes.to_vec());
        Ok(format!("/files/{}", logical_path))
    }
}

// ===== Service assembly =====

pub struct TestEnv {
    pub service: Arc<Service>,
    pub documents: Arc<MockDocumentRepo>,
    pub change_requests: Arc<MockChangeRequestRepo>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAuditSink>,
    pub files: Arc<MemoryFileStore>,
}

pub fn create_test_env() -> TestEnv {
    create_test_env_with(RecordingNotifier::new(), ServiceSettings::default())
}

pub fn create_test_env_with(notifier: RecordingNotifier, settings: ServiceSettings) -> TestEnv {
    let documents = Arc::new(MockDocumentRepo::new());
    let change_requests = Arc::new(MockChangeRequestRepo::new());
    let notifier = Arc::new(notifier);
    let audit = Arc::new(RecordingAuditSink::default());
    let files = Arc::new(MemoryFileStore::default());

    let service = Arc::new(Service::new(
        documents.clone(),
        change_requests.clone(),
        notifier.clone(),
        audit.clone(),
        files.clone(),
        settings,
    ));

    TestEnv {
        service,
        documents,
        change_requests,
        notifier,
        audit,
        files,
    }
}

// ===== Fixtures =====

pub fn person(id: &str) -> Person {
    Person::new(id, id.replace('-', " "), format!("{}@example.com", id))
}

pub fn admin() -> ActorContext {
    ActorContext::new("admin-1", Role::Admin).with_email("admin-1@example.com")
}

pub fn controller() -> ActorContext {
    ActorContext::new("controller-1", Role::DocumentController).with_email("controller-1@example.com")
}

pub fn owner() -> ActorContext {
    ActorContext::new("owner-1", Role::DocumentOwner).with_email("owner-1@example.com")
}

pub fn reviewer() -> ActorContext {
    ActorContext::new("reviewer-1", Role::Reviewer).with_email("reviewer-1@example.com")
}

pub fn creator() -> ActorContext {
    ActorContext::new("creator-1", Role::DocumentCreator).with_email("creator-1@example.com")
}

pub fn requester() -> ActorContext {
    ActorContext::new("requester-1", Role::Requester).with_email("requester-1@example.com")
}

/// A Finance SOP with one person in every collection
pub fn new_document(name: &str) -> NewDocument {
    let mut input = NewDocument::new(name, DocumentType::Sop, "Finance");
    input.language = Some(Language::English);
    input.requester = Some(person("requester-1"));
    input.document_owners = vec![person("owner-1")];
    input.reviewers = vec![person("reviewer-1")];
    input.document_creators = vec![person("creator-1")];
    input.compliance_contacts = vec![person("compliance-1")];
    input
}

/// Create a document and walk it to `live`
pub async fn live_document(env: &TestEnv, name: &str) -> Document {
    let doc = env
        .service
        .create_document(&controller(), new_document(name))
        .await
        .unwrap();
    env.service
        .take_action(&controller(), doc.id, None, None)
        .await
        .unwrap();
    env.service.approve(&requester(), doc.id, None).await.unwrap();
    env.service
        .push_live(&controller(), doc.id, None)
        .await
        .unwrap()
}
