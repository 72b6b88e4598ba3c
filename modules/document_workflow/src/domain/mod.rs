//! Domain layer - business logic and services

pub mod capabilities;
pub mod events;
pub mod files;
pub mod numbering;
pub mod repository;
pub mod service;
pub mod state_machine;
pub mod validation;
pub mod workflow;

pub use capabilities::{capabilities, document_capabilities, is_user_assigned_to_document, is_visible_to};
pub use events::{AuditRecord, AuditSink, NoOpAuditSink, NoOpNotifier, Notifier};
pub use files::FileStore;
pub use repository::{ChangeRequestRepository, DocumentRepository};
pub use service::{Service, ServiceSettings};
pub use state_machine::{can_transition, validate_transition, TransitionCause};
pub use workflow::WorkflowAction;
