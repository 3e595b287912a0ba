use crate::{
    config::StorageConfig,
    error::Result,
    storage::{decode_base64_image, traits::ImageStorage},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes PNGs to `{output_dir}/{base_name}-{epoch_millis}.png`.
///
/// The millisecond timestamp is the only uniqueness key, so two saves in the
/// same millisecond write to the same path. Files are never cleaned up.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    output_dir: PathBuf,
    base_name: String,
    public_prefix: String,
}

impl LocalImageStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            output_dir: config.output_dir(),
            base_name: config.base_name().to_string(),
            public_prefix: config.public_prefix().to_string(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn next_path(&self) -> PathBuf {
        let file = format!(
            "{}-{}.png",
            self.base_name,
            chrono::Utc::now().timestamp_millis()
        );
        self.output_dir.join(file)
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save_base64(&self, base64: &str) -> Result<(PathBuf, Vec<u8>)> {
        let bytes = decode_base64_image(base64)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.next_path();
        tokio::fs::write(&path, &bytes).await?;

        log::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok((path, bytes))
    }

    fn public_url(&self, path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.public_prefix, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn storage(dir: &Path) -> LocalImageStorage {
        LocalImageStorage::new(&StorageConfig::new().with_output_dir(dir.join("nested/output")))
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());
        let payload = vec![0x89, b'P', b'N', b'G', 0, 1, 2];

        let (path, bytes) = storage.save_base64(&STANDARD.encode(&payload)).await.unwrap();

        assert_eq!(bytes, payload);
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert_eq!(path.parent().unwrap(), storage.output_dir());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("manga-"));
        assert!(name.ends_with(".png"));
        assert!(name["manga-".len()..name.len() - ".png".len()]
            .chars()
            .all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_save_strips_data_url_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(b"pixels"));

        let (path, bytes) = storage.save_base64(&encoded).await.unwrap();
        assert_eq!(bytes, b"pixels");
        assert_eq!(std::fs::read(path).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_invalid_base64_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        assert!(storage.save_base64("not*base64!").await.is_err());
        assert!(!storage.output_dir().exists());
    }

    #[test]
    fn test_public_url() {
        let storage = LocalImageStorage::new(&StorageConfig::new());
        assert_eq!(
            storage.public_url(Path::new("public/output/manga-1700000000000.png")),
            "/public/output/manga-1700000000000.png"
        );
    }
}
