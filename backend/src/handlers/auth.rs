use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::json_body;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::services::accounts::{self, LoginRequest, RegisterRequest};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = json_body(payload)?;
    let user = accounts::register(state.store.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let request = json_body(payload)?;
    let user = accounts::login(state.store.as_ref(), request).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": user,
    })))
}

pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<Value> {
    Json(json!({ "user": user }))
}
