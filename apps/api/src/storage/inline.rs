use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::storage::{mime_for_extension, FileStore, StoredFile, UploadSlot, UploadedFile};

/// Inline storage for stateless deployments: no disk, no object store.
/// The reference is content-addressed (sha256 of the payload) and the URL is
/// a self-contained data URL the frontend can render or download directly.
pub struct InlineStore;

#[async_trait]
impl FileStore for InlineStore {
    async fn store(&self, file: &UploadedFile, slot: UploadSlot) -> Result<StoredFile, AppError> {
        let ext = file
            .extension()
            .ok_or_else(|| AppError::Storage("file has no extension".to_string()))?;
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| mime_for_extension(&ext).to_string());

        let digest = hex::encode(Sha256::digest(&file.bytes));
        let encoded = BASE64.encode(&file.bytes);

        Ok(StoredFile {
            key: format!("{}/{digest}", slot.category()),
            url: format!("data:{content_type};base64,{encoded}"),
            original_name: file.filename.clone(),
            content_type,
            size: file.bytes.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn png(bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            filename: "logo.png".to_string(),
            content_type: None,
            bytes: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn test_reference_is_content_addressed() {
        let a = InlineStore
            .store(&png(b"image-bytes"), UploadSlot::Logo)
            .await
            .unwrap();
        let b = InlineStore
            .store(&png(b"image-bytes"), UploadSlot::Logo)
            .await
            .unwrap();
        let c = InlineStore
            .store(&png(b"other-bytes"), UploadSlot::Logo)
            .await
            .unwrap();

        // same content, same key; different content, different key
        assert_eq!(a.key, b.key);
        assert_ne!(a.key, c.key);
        assert!(a.key.starts_with("logos/"));
    }

    #[tokio::test]
    async fn test_url_is_a_data_url() {
        let stored = InlineStore
            .store(&png(b"image-bytes"), UploadSlot::Logo)
            .await
            .unwrap();
        assert!(stored.url.starts_with("data:image/png;base64,"));
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.size, 11);
    }
}
