//! File storage seam for document attachments

use async_trait::async_trait;

/// Stores attachment bytes and returns a retrievable URL
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` under a logical path such as `<document-id>/<file-name>`
    async fn store(&self, logical_path: &str, bytes: &[u8]) -> anyhow::Result<String>;
}

/// Logical path of a document attachment.
///
/// The file name is reduced to its last path segment so callers cannot
/// escape the document's folder.
pub fn attachment_path(document_id: uuid::Uuid, file_name: &str) -> Option<String> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")?;
    Some(format!("{}/{}", document_id, name))
}
