use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{json_body, path_id};
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::UserProfile;
use crate::services::accounts::{self, PreferencesUpdate, ProfileUpdate};

pub async fn get_profile(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<UserProfile>> {
    let user_id = path_id(path, "userId", "Invalid user ID")?;
    let profile = accounts::public_profile(state.store.as_ref(), user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let update = json_body(payload)?;
    let user = accounts::update_profile(state.store.as_ref(), user, update).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<PreferencesUpdate>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let update = json_body(payload)?;
    let preferences = accounts::update_preferences(state.store.as_ref(), user.id, update).await?;

    Ok(Json(json!({
        "message": "Preferences updated successfully",
        "preferences": preferences,
    })))
}
