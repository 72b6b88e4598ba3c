//! Local file store for attachments

use crate::domain::files::FileStore;
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Writes attachments under a root directory
pub struct LocalFileStore {
    root: PathBuf,
    /// Prefix of returned URLs
    public_base: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    fn resolve(&self, logical_path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(logical_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("attachment path '{}' must stay inside the store", logical_path);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, logical_path: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let path = self.resolve(logical_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "attachment stored");
        Ok(format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            logical_path
        ))
    }
}
