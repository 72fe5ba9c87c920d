use axum::extract::{Multipart, Path, State};
use axum::Json;

use crate::auth::extract::AdminUser;
use crate::errors::AppError;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;
use crate::storage::{self, StoredFile, UploadSlot, UploadedFile};

/// POST /api/uploads/:slot — admin upload for entity image fields
/// (`logo`, `image`, `certificate_image`). Application documents never come
/// through here; they are part of the apply form.
pub async fn handle_upload(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(slot): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<StoredFile>>, AppError> {
    let slot = UploadSlot::from_field_name(&slot)
        .filter(|s| {
            matches!(
                *s,
                UploadSlot::Logo | UploadSlot::ProjectImage | UploadSlot::CertificateImage
            )
        })
        .ok_or_else(|| AppError::NotFound(format!("Unknown upload slot '{slot}'")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid("body", format!("malformed multipart body: {e}")))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid("file", format!("failed to read uploaded file: {e}")))?;
        let file = UploadedFile {
            filename,
            content_type,
            bytes,
        };
        let stored = storage::accept(state.files.as_ref(), &file, slot).await?;
        return Ok(ok(stored));
    }

    Err(AppError::invalid("file", "no file in request"))
}
