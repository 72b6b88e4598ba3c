//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::DocumentWorkflowApi;
pub use error::WorkflowError;
pub use model::{
    add_months, ActorContext, Attachment, AuditEvent, AuditKind, Capabilities, ChangeRequest,
    ChangeRequestFilter, ChangeRequestStatus, ChangeType, Document, DocumentFilter,
    DocumentPatch, DocumentStatus, DocumentType, Language, NewChangeRequest, NewDocument, Party,
    Person, RequestType, Role,
};
