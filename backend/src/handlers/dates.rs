use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    response::Json,
};
use uuid::Uuid;

use super::{json_body, path_id};
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::DateSuggestion;
use crate::services::dates::{
    self, ConfirmDateRequest, DateCompletion, DateConfirmation, DateDetails, DateProposal,
    SuggestDateRequest, VerifyDateRequest,
};

const DATE_ID_MESSAGE: &str = "Invalid date ID";

pub async fn suggest(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<SuggestDateRequest>, JsonRejection>,
) -> AppResult<Json<DateProposal>> {
    let request = json_body(payload)?;
    let proposal = dates::suggest_date(state.store.as_ref(), state.onchain.as_ref(), &user, request).await?;
    Ok(Json(proposal))
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ConfirmDateRequest>, JsonRejection>,
) -> AppResult<Json<DateConfirmation>> {
    let date_id = path_id(path, "dateId", DATE_ID_MESSAGE)?;
    let request = json_body(payload)?;
    let confirmation =
        dates::confirm_date(state.store.as_ref(), state.onchain.as_ref(), &user, date_id, request).await?;
    Ok(Json(confirmation))
}

pub async fn verify(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<VerifyDateRequest>, JsonRejection>,
) -> AppResult<Json<DateCompletion>> {
    let date_id = path_id(path, "dateId", DATE_ID_MESSAGE)?;
    let request = json_body(payload)?;
    let completion =
        dates::verify_date(state.store.as_ref(), state.onchain.as_ref(), &user, date_id, request).await?;
    Ok(Json(completion))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<DateDetails>> {
    let date_id = path_id(path, "dateId", DATE_ID_MESSAGE)?;
    let details = dates::get_date(state.store.as_ref(), &user, date_id).await?;
    Ok(Json(details))
}

pub async fn for_match(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<DateSuggestion>>> {
    let match_id = path_id(path, "matchId", "Invalid match ID")?;
    let dates = dates::dates_for_match(state.store.as_ref(), &user, match_id).await?;
    Ok(Json(dates))
}
