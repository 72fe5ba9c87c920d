use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::storage::{mime_for_extension, FileStore, StoredFile, UploadSlot, UploadedFile};

/// Filesystem-backed storage. Files land under `<root>/<category>/` with a
/// generated name and are served statically from `/uploads/...`.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskStore { root: root.into() }
    }
}

#[async_trait]
impl FileStore for DiskStore {
    async fn store(&self, file: &UploadedFile, slot: UploadSlot) -> Result<StoredFile, AppError> {
        // accept() has already checked the extension against the slot
        let ext = file
            .extension()
            .ok_or_else(|| AppError::Storage("file has no extension".to_string()))?;

        let dir = self.root.join(slot.category());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {e}", dir.display())))?;

        let name = format!("{}.{ext}", Uuid::new_v4());
        let path = dir.join(&name);
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", path.display())))?;

        info!(
            "Stored {} ({} bytes) at {}",
            file.filename,
            file.bytes.len(),
            path.display()
        );

        let key = format!("{}/{name}", slot.category());
        Ok(StoredFile {
            url: format!("/uploads/{key}"),
            key,
            original_name: file.filename.clone(),
            content_type: file
                .content_type
                .clone()
                .unwrap_or_else(|| mime_for_extension(&ext).to_string()),
            size: file.bytes.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.4 test"),
        }
    }

    #[tokio::test]
    async fn test_store_writes_file_under_category() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        let stored = store.store(&pdf("cv.pdf"), UploadSlot::Resume).await.unwrap();

        assert!(stored.key.starts_with("applications/"));
        assert!(stored.url.starts_with("/uploads/applications/"));
        assert_eq!(stored.original_name, "cv.pdf");

        let on_disk = tokio::fs::read(dir.path().join(&stored.key)).await.unwrap();
        assert_eq!(on_disk, b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn test_stored_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        let a = store.store(&pdf("cv.pdf"), UploadSlot::Resume).await.unwrap();
        let b = store.store(&pdf("cv.pdf"), UploadSlot::Resume).await.unwrap();
        assert_ne!(a.key, b.key);
    }
}
