pub mod lifecycle;
pub mod overlay;
pub mod pool;
pub mod registry;
pub mod resolver;
pub mod tables;

pub use overlay::{build_overlay, QueryConfig, SchemaConfig};
pub use pool::create_pool;
pub use resolver::resolve;
pub use tables::{TableDescriptor, TenantId, MAPS, USERS};

use sqlx::PgPool;
use std::sync::Arc;

/// Postgres-backed store shared by all handlers.
///
/// Cloning is cheap: the pool and schema settings are reference counted.
/// Every query checks a connection out of the pool for its own duration only.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: Arc<SchemaConfig>,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: SchemaConfig) -> Self {
        Self {
            pool,
            schema: Arc::new(schema),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }
}
