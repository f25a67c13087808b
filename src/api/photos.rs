//! Photo API handlers
//!
//! Multipart upload to the external storage service, main-photo selection,
//! and photo deletion.

use crate::api::utils::RouterState;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::members::{AppUser, MemberDb, PhotoDto};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Json,
    Extension,
};
use tracing::{error, warn};

/// Fetch the caller's account row; a missing row is an internal fault
/// because the auth layer already vouched for the username.
async fn caller_account(db: &MemberDb, username: &str) -> Result<AppUser, AppError> {
    db.get_user_by_username(username).await?.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Authenticated user {} has no account row",
            username
        ))
    })
}

/// POST /api/users/add-photo - Upload a photo for the caller
///
/// Forwards the file to the storage service; on success the photo is
/// appended to the caller's collection, marked main if it is their first.
pub async fn add_photo(
    State((db, storage)): State<RouterState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<PhotoDto>), AppError> {
    let mut file_name = String::from("upload");
    let mut file_bytes: Option<Vec<u8>> = None;

    // Parse multipart form data; only the "file" field matters here
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        AppError::Validation("Invalid multipart request".to_string())
    })? {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                file_name = name.to_string();
            }
            let data = field.bytes().await.map_err(|e| {
                error!("Failed to read file data: {}", e);
                AppError::Validation("Invalid multipart request".to_string())
            })?;
            file_bytes = Some(data.to_vec());
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AppError::Validation("No file was supplied".to_string()))?;

    let user = caller_account(&db, &auth_user.username).await?;

    let result = storage.upload(&file_name, file_bytes).await?;
    if let Some(service_error) = result.error {
        return Err(AppError::PhotoStorage(service_error.message));
    }

    let url = result
        .secure_url
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Storage service returned no URL")))?;

    // First photo becomes the main photo
    let existing = db.get_photos(user.id).await?;
    let is_main = existing.is_empty();

    let photo = db
        .add_photo(user.id, &url, result.public_id.as_deref(), is_main)
        .await
        .map_err(|e| {
            warn!(username = %auth_user.username, error = %e, "Photo insert failed");
            AppError::PersistenceFailed("Problem adding photo".to_string())
        })?;

    let mut headers = HeaderMap::new();
    // Percent-encode the username so the header stays valid whatever the
    // account name contains
    let location = format!("/api/users/{}", urlencoding::encode(&user.username));
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(PhotoDto::from(&photo))))
}

/// PUT /api/users/set-main-photo/:photoID - Make a photo the caller's main photo
pub async fn set_main_photo(
    State((db, _)): State<RouterState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(photo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = caller_account(&db, &auth_user.username).await?;

    let photos = db.get_photos(user.id).await?;
    // An unknown photo id faults here, matching the long-standing behavior
    // of this endpoint (it never had a not-found response).
    let photo = photos
        .iter()
        .find(|p| p.id == photo_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Photo {} not on user", photo_id)))?;

    if photo.is_main {
        return Err(AppError::Validation(
            "This is already your main photo".to_string(),
        ));
    }

    db.set_main_photo(user.id, photo_id).await.map_err(|e| {
        warn!(username = %auth_user.username, photo_id, error = %e, "Main photo change failed");
        AppError::PersistenceFailed("Something went wrong".to_string())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/delete-photo/:photoID - Delete one of the caller's photos
pub async fn delete_photo(
    State((db, storage)): State<RouterState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(photo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = caller_account(&db, &auth_user.username).await?;

    let photos = db.get_photos(user.id).await?;
    let photo = photos
        .iter()
        .find(|p| p.id == photo_id)
        .ok_or(AppError::PhotoNotFound)?;

    if photo.is_main {
        return Err(AppError::Validation(
            "You cannot delete your main photo".to_string(),
        ));
    }

    if let Some(public_id) = &photo.public_id {
        let result = storage.delete(public_id).await?;
        if let Some(service_error) = result.error {
            // The service error is logged but never returned to the caller;
            // the local row is removed regardless.
            warn!(
                username = %auth_user.username,
                photo_id,
                public_id = %public_id,
                message = %service_error.message,
                "Storage service failed to delete photo"
            );
        }
    }

    db.delete_photo(photo_id).await.map_err(|e| {
        warn!(username = %auth_user.username, photo_id, error = %e, "Photo deletion failed");
        AppError::PersistenceFailed("Problem occured while deleting photo".to_string())
    })?;

    Ok(StatusCode::OK)
}
