use super::error::ApiError;
use super::extract::CurrentSession;
use crate::Registry;
use crate::models::types::AccountId;
use axum::Json;
use axum::extract::{Path, State};
use linkit_core::types::{Profile, ProfileUpdate};
use std::sync::Arc;

/// `GET /api/profiles/{id}`; unknown or malformed ids yield `null`.
pub async fn get_by_id(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Profile>>, ApiError> {
    let Ok(id) = id.parse::<AccountId>() else {
        return Ok(Json(None));
    };
    let profile = registry.services.profile.get_by_id(id).await?;
    Ok(Json(profile.map(Into::into)))
}

/// `GET /api/profiles/by-username/{username}`
pub async fn get_by_username(
    State(registry): State<Arc<Registry>>,
    Path(username): Path<String>,
) -> Result<Json<Option<Profile>>, ApiError> {
    let profile = registry.services.profile.get_by_username(&username).await?;
    Ok(Json(profile.map(Into::into)))
}

/// `PATCH /api/profiles/me`
pub async fn update_me(
    State(registry): State<Arc<Registry>>,
    current: CurrentSession,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    let id = AccountId::from(current.data.user.id);
    let svc = &registry.services.profile;

    let profile = if update.is_empty() {
        svc.get_by_id(id).await?.ok_or_else(ApiError::unauthorized)?
    } else {
        svc.update(id, &update).await?
    };

    Ok(Json(profile.into()))
}
