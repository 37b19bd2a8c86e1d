use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::wallet_auth;
use crate::handlers;
use crate::services::OnchainServices;
use crate::store::Store;
use crate::utils::Config;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub onchain: Arc<dyn OnchainServices>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, onchain: Arc<dyn OnchainServices>, config: Config) -> Self {
        Self { store, onchain, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors_layer = create_cors_layer(&state.config);

    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        // Accounts
        .route("/auth/me", get(handlers::auth::me))
        .route("/profile", put(handlers::profile::update_profile))
        .route("/profile/preferences", put(handlers::profile::update_preferences))
        .route("/profile/{userId}", get(handlers::profile::get_profile))
        .route("/data/wallet-analysis", get(handlers::data::wallet_analysis))
        .route("/data/wallet-snapshot", get(handlers::data::wallet_snapshot))
        // Matching
        .route("/matches", get(handlers::matches::list))
        .route("/matches/suggestions", get(handlers::matches::suggestions))
        .route("/matches/{matchId}/like", post(handlers::matches::like))
        // Dates
        .route("/dates/suggest", post(handlers::dates::suggest))
        .route("/dates/match/{matchId}", get(handlers::dates::for_match))
        .route("/dates/{dateId}", get(handlers::dates::get))
        .route("/dates/{dateId}/confirm", post(handlers::dates::confirm))
        .route("/dates/{dateId}/verify", post(handlers::dates::verify))
        .route_layer(middleware::from_fn_with_state(state.clone(), wallet_auth));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn create_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .flatten()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        // Permissive for development
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

async fn health_check() -> &'static str {
    "OK"
}
