//! Document Workflow Module
//!
//! Role-gated lifecycle for compliance documents: a status state machine,
//! a role-capability resolver, document numbering and change requests.

// Public exports
pub mod contract;
pub use contract::{
    client::DocumentWorkflowApi, error::WorkflowError, ActorContext, Capabilities, ChangeRequest,
    ChangeRequestStatus, Document, DocumentStatus, Party, Person, Role,
};

pub mod module;
pub use module::DocumentWorkflowModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
