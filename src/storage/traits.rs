use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Destination for generated images.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Decodes a base64 payload (optionally `data:` prefixed) and persists it,
    /// returning the written path and the raw bytes.
    async fn save_base64(&self, base64: &str) -> Result<(PathBuf, Vec<u8>)>;

    /// Public URL under which a stored file is served.
    fn public_url(&self, path: &std::path::Path) -> String;
}
