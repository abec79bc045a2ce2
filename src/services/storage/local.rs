use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use super::{BlobStore, StoredBlob, Upload};

pub struct LocalBlobStore {
    root: PathBuf,
    public_path: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_path: &str) -> Self {
        Self {
            root: root.into(),
            public_path: public_path.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !key.is_empty() && !key.contains(['/', '\\']) && !key.starts_with('.'),
            "invalid blob key: {key}"
        );
        Ok(self.root.join(key))
    }
}

// Keeps a short alphanumeric extension from the client's file name.
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, file: &Upload) -> anyhow::Result<StoredBlob> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let key = match extension_of(&file.file_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id,
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create upload dir {}", self.root.display()))?;
        let path = self.path_for(&key)?;
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("failed to write blob {}", path.display()))?;

        tracing::debug!(key = %key, size = file.bytes.len(), "stored blob");

        Ok(StoredBlob {
            url: format!("{}/{key}", self.public_path),
            size: file.bytes.len() as i64,
            key,
        })
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(key = %key, "blob already gone");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("failed to remove blob {}", path.display())),
        }
    }
}
