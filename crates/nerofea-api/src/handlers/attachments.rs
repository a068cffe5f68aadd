//! Attachment HTTP handlers: multipart upload, listing, download, delete.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use base64::Engine;
use serde::Serialize;
use uuid::Uuid;

use nerofea_core::{AttachmentStore, NoteRepository};

use crate::{ApiError, AppState};

/// Upload a file attachment for a note.
///
/// Multipart fields: `file` (required) and `user_id` (required).
/// Validation (size cap, MIME allow-list, executable rejection) runs before
/// any storage write.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let store = state
        .db
        .attachments
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("File storage not configured".to_string()))?;

    if !state.db.notes.exists(note_id).await? {
        return Err(ApiError::NotFound(format!("Note {} not found", note_id)));
    }

    let mut file_name: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                mime_type = field.content_type().map(str::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            "user_id" => {
                user_id = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read user_id: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    let user_id = user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;
    let file_name = file_name.unwrap_or_else(|| "unnamed_file".to_string());
    let mime_type =
        mime_type.ok_or_else(|| ApiError::BadRequest("File content type is required".to_string()))?;

    let attachment = store
        .upload(note_id, &user_id, &file_name, &mime_type, &data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "attachment": attachment
        })),
    ))
}

/// List attachments of a note.
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state
        .db
        .attachments
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("File storage not configured".to_string()))?;

    let attachments = store.list_for_note(note_id).await?;
    Ok(Json(serde_json::json!(attachments)))
}

#[derive(Debug, Serialize)]
pub struct DownloadAttachmentResponse {
    /// Base64-encoded file contents.
    pub data: String,
    pub content_type: String,
    pub filename: String,
}

/// Download an attachment as a base64 payload.
pub async fn download_attachment(
    State(state): State<AppState>,
    Path(attachment_id): Path<Uuid>,
) -> Result<Json<DownloadAttachmentResponse>, ApiError> {
    let store = state
        .db
        .attachments
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("File storage not configured".to_string()))?;

    let (data, content_type, filename) = store.download(attachment_id).await?;
    let encoded_data = base64::engine::general_purpose::STANDARD.encode(&data);

    Ok(Json(DownloadAttachmentResponse {
        data: encoded_data,
        content_type,
        filename,
    }))
}

/// Delete an attachment.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(attachment_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state
        .db
        .attachments
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("File storage not configured".to_string()))?;

    store.delete(attachment_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Attachment deleted successfully"
    })))
}
