//! Map store server library
//!
//! Shared-database services for imported maps: per-map table sets addressed by
//! numeric suffix, id-or-name reference resolution, user lookup and job status
//! polling.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod job_status;
pub mod models;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{create_pool, PgStore, SchemaConfig};
pub use error::{AppError, Result};
pub use routes::router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given pool and configuration
    pub fn new(pool: sqlx::PgPool, config: Config) -> Self {
        let schema = SchemaConfig::new(config.database_schema.clone());
        Self {
            store: PgStore::new(pool, schema),
            config,
        }
    }
}
