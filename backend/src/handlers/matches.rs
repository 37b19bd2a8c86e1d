use axum::{
    extract::{rejection::PathRejection, Extension, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::path_id;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::Match;
use crate::services::matching::{self, LikeResponse, MatchSuggestion, SuggestionPage};

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub async fn suggestions(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<Vec<MatchSuggestion>>> {
    let page = SuggestionPage::parse(query.limit.as_deref(), query.offset.as_deref())?;
    let suggestions = matching::suggest_matches(state.store.as_ref(), user.id, page).await?;
    Ok(Json(suggestions))
}

/// `matchId` in the path is the id of the user being liked.
pub async fn like(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<LikeResponse>> {
    let target = path_id(path, "matchId", "Invalid user ID")?;
    let response = matching::like_user(state.store.as_ref(), state.onchain.as_ref(), user.id, target).await?;
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<Vec<Match>>> {
    let matches = matching::list_matches(state.store.as_ref(), user.id).await?;
    Ok(Json(matches))
}
