pub mod connection;
pub mod dates;
pub mod matches;
pub mod migrations;
pub mod pg_store;
pub mod users;

pub use connection::{get_db_pool, DatabaseConfig};
pub use pg_store::PgStore;
