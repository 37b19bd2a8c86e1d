use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::constants::WALLET_HEADER;
use crate::error::AppError;
use crate::models::User;
use crate::utils::validation::is_valid_solana_address;

/// The caller resolved from the wallet header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Resolves the `x-solana-address` header to a registered user and stores it
/// in the request extensions as [`AuthUser`].
pub async fn wallet_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let address = request
        .headers()
        .get(WALLET_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No wallet address provided".to_string()))?
        .to_string();

    if !is_valid_solana_address(&address) {
        tracing::debug!("Rejected malformed wallet header: {}", address);
        return Err(AppError::Unauthorized("Invalid wallet address format".to_string()));
    }

    let user = state
        .store
        .user_by_address(&address)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    tracing::debug!("Authenticated {} as user {}", address, user.id);
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}
