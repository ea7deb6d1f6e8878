//! In-memory [`FileStorage`].
//!
//! Files live in a path-keyed map; download URLs are `<base_url><path>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use banner_core::error::CoreError;
use banner_core::persistence::{
    FileMetadata, FileStorage, ProgressCallback, UploadMetadata, UploadProgress, UploadResult,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Default URL prefix for stored files.
pub const DEFAULT_BASE_URL: &str = "memory://";

/// Bytes transferred between two progress reports.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

struct StoredFile {
    bytes: Vec<u8>,
    metadata: FileMetadata,
}

/// Shared-state file storage. Clones share the same files.
#[derive(Clone)]
pub struct InMemoryFileStorage {
    files: Arc<RwLock<BTreeMap<String, StoredFile>>>,
    base_url: String,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            base_url: base_url.into(),
        }
    }

    /// Raw bytes of a stored file.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, CoreError> {
        let files = self.files.read().await;
        files
            .get(path)
            .map(|file| file.bytes.clone())
            .ok_or_else(|| StoreError::FileNotFound(path.to_string()).into())
    }

    fn download_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn store(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: Option<UploadMetadata>,
    ) -> Result<UploadResult, StoreError> {
        let name = file_name(path)?;
        let metadata = metadata.unwrap_or_default();
        let now = Utc::now();
        let content_type = metadata
            .content_type
            .unwrap_or_else(|| guess_content_type(name).to_string());

        let file_metadata = FileMetadata {
            name: name.to_string(),
            size: bytes.len() as u64,
            content_type,
            time_created: now,
            updated: now,
            download_url: self.download_url(path),
            custom: metadata.custom,
        };

        self.files.write().await.insert(
            path.to_string(),
            StoredFile {
                bytes,
                metadata: file_metadata.clone(),
            },
        );
        tracing::debug!(path, size = file_metadata.size, "File stored");

        Ok(UploadResult {
            download_url: file_metadata.download_url.clone(),
            metadata: file_metadata,
            path: path.to_string(),
        })
    }
}

impl Default for InMemoryFileStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Last path segment; empty paths and trailing slashes are rejected.
fn file_name(path: &str) -> Result<&str, StoreError> {
    match path.rsplit('/').next() {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}

/// MIME type from the file extension.
pub fn guess_content_type(name: &str) -> &'static str {
    let Some((_, extension)) = name.rsplit_once('.') else {
        return FALLBACK_CONTENT_TYPE;
    };
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

impl FileStorage for InMemoryFileStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: Option<UploadMetadata>,
    ) -> Result<UploadResult, CoreError> {
        Ok(self.store(path, bytes, metadata).await?)
    }

    async fn upload_with_progress(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: Option<UploadMetadata>,
        mut on_progress: ProgressCallback,
    ) -> Result<UploadResult, CoreError> {
        file_name(path)?;
        let total = bytes.len() as u64;
        let mut transferred = 0u64;
        on_progress(UploadProgress::new(transferred, total));
        for chunk in bytes.chunks(UPLOAD_CHUNK_BYTES) {
            tokio::task::yield_now().await;
            transferred += chunk.len() as u64;
            on_progress(UploadProgress::new(transferred, total));
        }
        Ok(self.store(path, bytes, metadata).await?)
    }

    async fn metadata(&self, path: &str) -> Result<FileMetadata, CoreError> {
        let files = self.files.read().await;
        files
            .get(path)
            .map(|file| file.metadata.clone())
            .ok_or_else(|| StoreError::FileNotFound(path.to_string()).into())
    }

    async fn update_metadata(&self, path: &str, metadata: UploadMetadata) -> Result<FileMetadata, CoreError> {
        let mut files = self.files.write().await;
        let file = files
            .get_mut(path)
            .ok_or_else(|| StoreError::FileNotFound(path.to_string()))?;
        if let Some(content_type) = metadata.content_type {
            file.metadata.content_type = content_type;
        }
        file.metadata.custom.extend(metadata.custom);
        file.metadata.updated = Utc::now();
        Ok(file.metadata.clone())
    }

    async fn delete(&self, path: &str) -> Result<(), CoreError> {
        let removed = self.files.write().await.remove(path);
        match removed {
            Some(_) => {
                tracing::debug!(path, "File deleted");
                Ok(())
            }
            None => Err(StoreError::FileNotFound(path.to_string()).into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let files = self.files.read().await;
        Ok(files
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    #[tokio::test]
    async fn upload_records_metadata() {
        let storage = InMemoryFileStorage::new();
        let result = storage
            .upload("banners/media/shoe.PNG", vec![1, 2, 3], None)
            .await
            .unwrap();

        assert_eq!(result.path, "banners/media/shoe.PNG");
        assert_eq!(result.download_url, "memory://banners/media/shoe.PNG");
        assert_eq!(result.metadata.name, "shoe.PNG");
        assert_eq!(result.metadata.size, 3);
        assert_eq!(result.metadata.content_type, "image/png");
        assert_eq!(storage.read("banners/media/shoe.PNG").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn explicit_content_type_wins() {
        let storage = InMemoryFileStorage::new();
        let metadata = UploadMetadata {
            content_type: Some("image/webp".to_string()),
            ..Default::default()
        };
        let result = storage.upload("a/blob", vec![0], Some(metadata)).await.unwrap();
        assert_eq!(result.metadata.content_type, "image/webp");
    }

    #[tokio::test]
    async fn upload_rejects_directory_paths() {
        let storage = InMemoryFileStorage::new();
        assert_matches!(
            storage.upload("banners/media/", vec![1], None).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_finishes_at_100() {
        let storage = InMemoryFileStorage::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let bytes = vec![7u8; UPLOAD_CHUNK_BYTES * 2 + 10];

        storage
            .upload_with_progress(
                "media/big.jpg",
                bytes,
                None,
                Box::new(move |p: UploadProgress| sink.lock().unwrap().push(p.percentage)),
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], 0.0);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
    }

    #[tokio::test]
    async fn empty_upload_reports_complete() {
        let storage = InMemoryFileStorage::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        storage
            .upload_with_progress("media/empty.png", vec![], None, Box::new(move |p: UploadProgress| sink.lock().unwrap().push(p)))
            .await
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].percentage, 100.0);
    }

    #[tokio::test]
    async fn update_metadata_merges_custom_fields() {
        let storage = InMemoryFileStorage::new();
        let mut custom = BTreeMap::new();
        custom.insert("banner".to_string(), "b1".to_string());
        storage
            .upload(
                "media/a.png",
                vec![1],
                Some(UploadMetadata {
                    content_type: None,
                    custom,
                }),
            )
            .await
            .unwrap();

        let mut extra = BTreeMap::new();
        extra.insert("alt".to_string(), "Red shoe".to_string());
        let updated = storage
            .update_metadata(
                "media/a.png",
                UploadMetadata {
                    content_type: None,
                    custom: extra,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content_type, "image/png");
        assert_eq!(updated.custom.len(), 2);
        assert_eq!(storage.metadata("media/a.png").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_and_list() {
        let storage = InMemoryFileStorage::new();
        storage.upload("banners/media/b.png", vec![1], None).await.unwrap();
        storage.upload("banners/media/a.png", vec![1], None).await.unwrap();
        storage.upload("other/c.png", vec![1], None).await.unwrap();

        assert_eq!(
            storage.list("banners/").await.unwrap(),
            vec!["banners/media/a.png", "banners/media/b.png"]
        );

        storage.delete("banners/media/a.png").await.unwrap();
        assert_matches!(
            storage.delete("banners/media/a.png").await,
            Err(CoreError::NotFound { entity: "file", .. })
        );
        assert_matches!(
            storage.metadata("banners/media/a.png").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn content_type_guessing() {
        assert_eq!(guess_content_type("x.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("x.SVG"), "image/svg+xml");
        assert_eq!(guess_content_type("README"), FALLBACK_CONTENT_TYPE);
    }
}
