use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::WalletAnalysis;
use crate::services::accounts;
use crate::services::reputation::{self, WalletSnapshot};

pub async fn wallet_analysis(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<WalletAnalysis>> {
    let analysis = accounts::wallet_analysis(state.store.as_ref(), user.id).await?;
    Ok(Json(analysis))
}

pub async fn wallet_snapshot(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<WalletSnapshot>> {
    let snapshot = reputation::wallet_snapshot(state.store.as_ref(), &user).await?;
    Ok(Json(snapshot))
}
