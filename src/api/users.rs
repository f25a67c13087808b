//! Member API handlers
//!
//! Contains HTTP request handlers for listing members, fetching a single
//! member, and updating the caller's own profile.

use crate::api::utils::{pagination_header, ListParams, RouterState};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::members::{MemberDto, MemberUpdateDto};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use chrono::Utc;
use tracing::warn;

/// Resolve the gender filter for a listing request
///
/// When the client supplies no filter, the listing defaults to the opposite
/// of the caller's recorded gender.
fn resolve_gender(requested: Option<&str>, caller_gender: Option<&str>) -> String {
    match requested {
        Some(gender) if !gender.is_empty() => gender.to_string(),
        _ => {
            if caller_gender == Some("male") {
                "female".to_string()
            } else {
                "male".to_string()
            }
        }
    }
}

/// GET /api/users - List members with pagination and filters
pub async fn list_users(
    State((db, _)): State<RouterState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<ListParams>,
) -> Result<(HeaderMap, Json<Vec<MemberDto>>), AppError> {
    let caller_gender = db.get_user_gender(&auth_user.username).await?;
    let gender = resolve_gender(params.gender.as_deref(), caller_gender.as_deref());

    let filter = params.to_filter(&auth_user.username, gender, Utc::now().date_naive());
    let page = db.list_members(&filter).await?;

    let headers = pagination_header(&page);
    Ok((headers, Json(page.items)))
}

/// GET /api/users/:username - Get a single member
///
/// Returns the raw lookup result: a missing member serializes as JSON
/// `null` with status 200 rather than a 404.
pub async fn get_user(
    State((db, _)): State<RouterState>,
    Path(username): Path<String>,
) -> Result<Json<Option<MemberDto>>, AppError> {
    let member = db.get_member(&username).await?;
    Ok(Json(member))
}

/// PUT /api/users - Update the caller's own profile
///
/// The target user comes from the authenticated caller, never from the
/// request path or body.
pub async fn update_user(
    State((db, _)): State<RouterState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(update): Json<MemberUpdateDto>,
) -> Result<StatusCode, AppError> {
    let user = db
        .get_user_by_username(&auth_user.username)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Authenticated user {} has no account row",
                auth_user.username
            ))
        })?;

    db.update_profile(user.id, &update).await.map_err(|e| {
        warn!(username = %auth_user.username, error = %e, "Profile update failed");
        AppError::PersistenceFailed("Failed to update user".to_string())
    })?;

    Ok(StatusCode::NO_CONTENT)
}
