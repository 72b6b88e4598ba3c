//! Infrastructure layer - storage and outbound adapters

pub mod files;
pub mod notify;
pub mod storage;
