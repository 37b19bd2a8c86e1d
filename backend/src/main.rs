use std::sync::Arc;

use dinetime::{
    create_router,
    db::{self, DatabaseConfig},
    get_db_pool,
    services::PlaceholderOnchain,
    utils, AppState, Config, PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(PlaceholderOnchain),
        config,
    );
    tracing::info!("Using {} store", state.store.backend_tag());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
