//! Upload storage — pluggable, trait-based persistence for files attached to
//! entities (logos, project galleries, certificate scans, application
//! documents).
//!
//! Default: `DiskStore` (writes under UPLOAD_DIR, served at `/uploads/...`).
//! Alternative: `InlineStore` (content-addressed data URLs, for stateless
//! deployments with no persistent disk).
//!
//! `AppState` holds an `Arc<dyn FileStore>`, selected at startup via config.

pub mod disk;
pub mod handlers;
pub mod inline;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub use disk::DiskStore;
pub use inline::InlineStore;

/// Ceiling on attachments per application, counting every slot.
pub const MAX_FILES_PER_APPLICATION: usize = 10;

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const RESUME_EXTS: &[&str] = &["pdf", "doc", "docx"];
const DOCUMENT_EXTS: &[&str] = &["pdf", "jpg", "png", "doc", "docx"];

const MB: usize = 1024 * 1024;

/// A named file-attachment purpose with its own allowed types and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSlot {
    Logo,
    ProjectImage,
    CertificateImage,
    Resume,
    CoverLetter,
    Portfolio,
    CertificateDoc,
}

impl UploadSlot {
    /// Subdirectory (and URL segment) files of this slot are stored under.
    pub fn category(self) -> &'static str {
        match self {
            UploadSlot::Logo => "logos",
            UploadSlot::ProjectImage => "projects",
            UploadSlot::CertificateImage => "certificates",
            UploadSlot::Resume | UploadSlot::CoverLetter => "applications",
            UploadSlot::Portfolio | UploadSlot::CertificateDoc => "applications",
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadSlot::Logo | UploadSlot::ProjectImage | UploadSlot::CertificateImage => {
                IMAGE_EXTS
            }
            UploadSlot::Resume | UploadSlot::CoverLetter => RESUME_EXTS,
            UploadSlot::Portfolio | UploadSlot::CertificateDoc => DOCUMENT_EXTS,
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            UploadSlot::Logo | UploadSlot::ProjectImage | UploadSlot::CertificateImage => 5 * MB,
            _ => 10 * MB,
        }
    }

    /// Multipart/route field name for the slot.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadSlot::Logo => "logo",
            UploadSlot::ProjectImage => "image",
            UploadSlot::CertificateImage => "certificate_image",
            UploadSlot::Resume => "resume",
            UploadSlot::CoverLetter => "coverLetter",
            UploadSlot::Portfolio => "portfolio",
            UploadSlot::CertificateDoc => "certificates",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "logo" => Some(UploadSlot::Logo),
            "image" => Some(UploadSlot::ProjectImage),
            "certificate_image" => Some(UploadSlot::CertificateImage),
            "resume" => Some(UploadSlot::Resume),
            "coverLetter" => Some(UploadSlot::CoverLetter),
            "portfolio" => Some(UploadSlot::Portfolio),
            "certificates" | "certificates[]" => Some(UploadSlot::CertificateDoc),
            _ => None,
        }
    }
}

/// A fully buffered inbound file, prior to validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Stable reference to a stored file, persisted on the owning entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// Backend-specific key: a relative path on disk, a digest inline.
    pub key: String,
    /// Where the file can be fetched from: `/uploads/...` or a data URL.
    pub url: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, file: &UploadedFile, slot: UploadSlot) -> Result<StoredFile, AppError>;
}

/// Validates a buffered file against its slot's constraints, then persists it.
/// Rejections are validation errors keyed by the slot's field name; an
/// unsupported type or oversize payload is never stored.
pub async fn accept(
    store: &dyn FileStore,
    file: &UploadedFile,
    slot: UploadSlot,
) -> Result<StoredFile, AppError> {
    let field = slot.field_name();

    let ext = file.extension().ok_or_else(|| {
        AppError::invalid(field, format!("'{}' has no file extension", file.filename))
    })?;
    if !slot.allowed_extensions().contains(&ext.as_str()) {
        return Err(AppError::invalid(
            field,
            format!(
                "unsupported file type '.{ext}' — allowed: {}",
                slot.allowed_extensions().join(", ")
            ),
        ));
    }

    if file.bytes.len() > slot.max_bytes() {
        return Err(AppError::invalid(
            field,
            format!(
                "file exceeds the {} MB limit for this field",
                slot.max_bytes() / MB
            ),
        ));
    }

    store.store(file, slot).await
}

pub(crate) fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: None,
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    struct NullStore;

    #[async_trait]
    impl FileStore for NullStore {
        async fn store(
            &self,
            file: &UploadedFile,
            slot: UploadSlot,
        ) -> Result<StoredFile, AppError> {
            Ok(StoredFile {
                key: format!("{}/{}", slot.category(), file.filename),
                url: String::new(),
                original_name: file.filename.clone(),
                content_type: String::new(),
                size: file.bytes.len() as i64,
            })
        }
    }

    #[tokio::test]
    async fn test_exe_resume_is_rejected() {
        let err = accept(&NullStore, &file("malware.exe", 100), UploadSlot::Resume)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields[0].field, "resume");
                assert!(fields[0].message.contains(".exe"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extension_check_is_case_insensitive() {
        assert!(accept(&NullStore, &file("cv.PDF", 100), UploadSlot::Resume)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_oversize_file_is_rejected() {
        let err = accept(
            &NullStore,
            &file("cv.pdf", 10 * MB + 1),
            UploadSlot::Resume,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_file_at_limit_is_accepted() {
        assert!(
            accept(&NullStore, &file("cv.pdf", 10 * MB), UploadSlot::Resume)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_missing_extension_is_rejected() {
        assert!(accept(&NullStore, &file("resume", 10), UploadSlot::Resume)
            .await
            .is_err());
    }

    #[test]
    fn test_certificate_slot_allows_images() {
        assert!(UploadSlot::CertificateDoc
            .allowed_extensions()
            .contains(&"jpg"));
        assert!(!UploadSlot::Resume.allowed_extensions().contains(&"jpg"));
    }

    #[test]
    fn test_field_name_round_trip() {
        for slot in [
            UploadSlot::Logo,
            UploadSlot::ProjectImage,
            UploadSlot::CertificateImage,
            UploadSlot::Resume,
            UploadSlot::CoverLetter,
            UploadSlot::Portfolio,
            UploadSlot::CertificateDoc,
        ] {
            assert_eq!(UploadSlot::from_field_name(slot.field_name()), Some(slot));
        }
        assert_eq!(UploadSlot::from_field_name("payload"), None);
    }
}
