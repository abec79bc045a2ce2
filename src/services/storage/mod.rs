pub mod local;

use async_trait::async_trait;
use axum::body::Bytes;

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
    pub size: i64,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, file: &Upload) -> anyhow::Result<StoredBlob>;
    // Removing a key that no longer exists succeeds.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
