use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use super::tables::quote_ident;

/// `SET search_path` statement pinning a session to `schema`
pub fn search_path_sql(schema: &str) -> String {
    format!("SET search_path TO {}", quote_ident(schema))
}

/// Create a PostgreSQL connection pool
///
/// Every connection resolves unqualified names in `schema`, so migrations
/// create the shared tables there. The schema is created if missing.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    schema: &str,
) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Creating database connection pool...");

    let search_path = search_path_sql(schema);
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                sqlx::query(&search_path).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;

    // search_path may name a schema that does not exist yet; Postgres
    // resolves it lazily, so creating it now is enough for open sessions
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
        .execute(&pool)
        .await?;

    tracing::info!("Database connection pool created for schema {}", schema);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_path_quotes_schema() {
        assert_eq!(search_path_sql("osm"), "SET search_path TO \"osm\"");
        assert_eq!(search_path_sql("we\"ird"), "SET search_path TO \"we\"\"ird\"");
    }
}
