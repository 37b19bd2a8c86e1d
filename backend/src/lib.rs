pub mod app;
pub mod auth;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use app::{create_router, AppState};
pub use db::{get_db_pool, PgStore};
pub use error::{AppError, AppResult};
pub use store::{MemoryStore, Store};
pub use utils::config::Config;

// Re-export common types
pub use anyhow::Result;
pub use chrono::{DateTime, Utc};
pub use sqlx::PgPool;
pub use uuid::Uuid;
