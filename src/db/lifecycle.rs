//! Creation, teardown and auditing of per-map table sets.
//!
//! All DDL for one call runs in a single session that is committed once at the
//! end. Dropping uses `IF EXISTS`, so tearing down a map that is already gone,
//! or only partly present, succeeds. On stores with transactional DDL (such as
//! PostgreSQL) a failed call leaves nothing behind; elsewhere the statements
//! listed as executed in [`TeardownFailure`] may have taken effect, and a retry
//! converges either way.

use serde::Serialize;
use std::future::Future;

use super::tables::{
    all_sequence_names, all_table_names, physical_table_name, quote_ident, sequence_name,
    CanonicalTable, TenantId,
};
use super::PgStore;
use crate::constants::SEQUENCE_SUFFIX;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlKind {
    CreateSequence,
    CreateTable,
    DropTable,
    DropSequence,
}

/// One DDL statement and the object it touches
#[derive(Debug, Clone)]
pub struct DdlStatement {
    pub kind: DdlKind,
    pub object: String,
    pub sql: String,
}

/// A connection-scoped unit of DDL.
///
/// Dropping a session without calling [`DdlSession::finish`] must release it
/// without committing.
pub trait DdlSession: Send {
    fn run(&mut self, statement: &DdlStatement) -> impl Future<Output = Result<()>> + Send;

    fn finish(self) -> impl Future<Output = Result<()>> + Send;
}

/// Catalog access needed to manage map table sets
pub trait SchemaCatalog: Sync {
    type Session: DdlSession;

    fn schema_name(&self) -> &str;

    fn begin(&self) -> impl Future<Output = Result<Self::Session>> + Send;

    /// Tables in the schema whose name ends with `suffix`
    fn count_tables_with_suffix(&self, suffix: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Sequences in the schema whose name ends with `suffix`
    fn count_sequences_with_suffix(
        &self,
        suffix: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Tables in the schema whose name starts with `prefix`, sorted
    fn tables_with_prefix(&self, prefix: &str)
        -> impl Future<Output = Result<Vec<String>>> + Send;

    /// The subset of `names` that exist as tables in the schema
    fn existing_tables(
        &self,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// The subset of `names` that exist as sequences in the schema
    fn existing_sequences(
        &self,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Total on-disk size of a table including indexes, 0 when absent
    fn table_size_bytes(&self, name: &str) -> impl Future<Output = Result<i64>> + Send;
}

/// Outcome of a successful teardown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropReport {
    pub tenant: TenantId,
    /// Objects whose drop statement succeeded, including ones already absent
    pub dropped: Vec<String>,
}

/// A teardown that stopped partway
#[derive(Debug, thiserror::Error)]
#[error("failed at {failed} for map {tenant}")]
pub struct TeardownFailure {
    pub tenant: TenantId,
    /// Statements that ran before the failure
    pub executed: Vec<String>,
    /// Object whose statement failed, or `commit`
    pub failed: String,
    pub not_attempted: Vec<String>,
    #[source]
    pub source: AppError,
}

pub fn create_statements(schema: &str, tenant: TenantId) -> Vec<DdlStatement> {
    let schema = quote_ident(schema);

    let sequences = CanonicalTable::SEQUENCED.into_iter().map(|table| {
        let name = sequence_name(table.as_str(), tenant);
        DdlStatement {
            kind: DdlKind::CreateSequence,
            sql: format!("CREATE SEQUENCE IF NOT EXISTS {schema}.{}", quote_ident(&name)),
            object: name,
        }
    });

    let tables = CanonicalTable::ALL.into_iter().map(|table| {
        let name = physical_table_name(table.as_str(), tenant);
        // the regclass text is an SQL string literal
        let sequence = format!("{schema}.{}", quote_ident(&sequence_name(table.as_str(), tenant)));
        let id_default = format!("nextval('{}'::regclass)", sequence.replace('\'', "''"));
        DdlStatement {
            kind: DdlKind::CreateTable,
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {schema}.{} ({})",
                quote_ident(&name),
                column_definitions(table, &id_default)
            ),
            object: name,
        }
    });

    // sequences first: the tables default their ids from them
    sequences.chain(tables).collect()
}

pub fn drop_statements(schema: &str, tenant: TenantId) -> Vec<DdlStatement> {
    let schema = quote_ident(schema);

    let tables = all_table_names(tenant).into_iter().map(|name| DdlStatement {
        kind: DdlKind::DropTable,
        sql: format!("DROP TABLE IF EXISTS {schema}.{}", quote_ident(&name)),
        object: name,
    });
    let sequences = all_sequence_names(tenant).into_iter().map(|name| DdlStatement {
        kind: DdlKind::DropSequence,
        sql: format!("DROP SEQUENCE IF EXISTS {schema}.{}", quote_ident(&name)),
        object: name,
    });

    tables.chain(sequences).collect()
}

fn column_definitions(table: CanonicalTable, id_default: &str) -> String {
    const ELEMENT_COLUMNS: &str = "changeset_id BIGINT NOT NULL, \
         visible BOOLEAN NOT NULL DEFAULT TRUE, \
         \"timestamp\" TIMESTAMPTZ NOT NULL DEFAULT now(), \
         version BIGINT NOT NULL DEFAULT 1, \
         tags JSONB NOT NULL DEFAULT '{}'::jsonb";

    match table {
        CanonicalTable::CurrentNodes => format!(
            "id BIGINT PRIMARY KEY DEFAULT {id_default}, \
             latitude DOUBLE PRECISION NOT NULL, \
             longitude DOUBLE PRECISION NOT NULL, \
             tile BIGINT NOT NULL DEFAULT 0, \
             {ELEMENT_COLUMNS}"
        ),
        CanonicalTable::CurrentWays | CanonicalTable::CurrentRelations => {
            format!("id BIGINT PRIMARY KEY DEFAULT {id_default}, {ELEMENT_COLUMNS}")
        }
        CanonicalTable::CurrentWayNodes => "way_id BIGINT NOT NULL, \
             node_id BIGINT NOT NULL, \
             sequence_id BIGINT NOT NULL, \
             PRIMARY KEY (way_id, sequence_id)"
            .to_string(),
        CanonicalTable::CurrentRelationMembers => "relation_id BIGINT NOT NULL, \
             member_type TEXT NOT NULL CHECK (member_type IN ('node', 'way', 'relation')), \
             member_id BIGINT NOT NULL, \
             member_role TEXT NOT NULL DEFAULT '', \
             sequence_id INTEGER NOT NULL, \
             PRIMARY KEY (relation_id, sequence_id)"
            .to_string(),
        CanonicalTable::Changesets => format!(
            "id BIGINT PRIMARY KEY DEFAULT {id_default}, \
             user_id BIGINT NOT NULL, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             closed_at TIMESTAMPTZ, \
             min_lat DOUBLE PRECISION, \
             max_lat DOUBLE PRECISION, \
             min_lon DOUBLE PRECISION, \
             max_lon DOUBLE PRECISION, \
             num_changes INTEGER NOT NULL DEFAULT 0, \
             tags JSONB NOT NULL DEFAULT '{{}}'::jsonb"
        ),
    }
}

/// Create every table and sequence for a map. Idempotent.
pub async fn create_tenant<C: SchemaCatalog>(catalog: &C, tenant: TenantId) -> Result<()> {
    let statements = create_statements(catalog.schema_name(), tenant);

    let mut session = catalog.begin().await?;
    for statement in &statements {
        session.run(statement).await?;
    }
    session.finish().await?;

    tracing::info!(
        "Created {} tables and sequences for map {}",
        statements.len(),
        tenant
    );
    Ok(())
}

/// Drop every table and sequence for a map. Absent objects are not an error.
pub async fn drop_tenant<C: SchemaCatalog>(catalog: &C, tenant: TenantId) -> Result<DropReport> {
    let statements = drop_statements(catalog.schema_name(), tenant);

    let mut session = catalog.begin().await?;
    let mut executed = Vec::with_capacity(statements.len());

    for (index, statement) in statements.iter().enumerate() {
        if let Err(source) = session.run(statement).await {
            let not_attempted = statements[index + 1..]
                .iter()
                .map(|s| s.object.clone())
                .collect();
            return Err(teardown_failure(
                tenant,
                executed,
                statement.object.clone(),
                not_attempted,
                source,
            ));
        }
        executed.push(statement.object.clone());
    }

    if let Err(source) = session.finish().await {
        return Err(teardown_failure(
            tenant,
            executed,
            "commit".to_string(),
            Vec::new(),
            source,
        ));
    }

    tracing::info!("Dropped tables and sequences for map {}", tenant);
    Ok(DropReport {
        tenant,
        dropped: executed,
    })
}

fn teardown_failure(
    tenant: TenantId,
    executed: Vec<String>,
    failed: String,
    not_attempted: Vec<String>,
    source: AppError,
) -> AppError {
    tracing::warn!(
        "Teardown of map {} failed at {} after {} statements: {}",
        tenant,
        failed,
        executed.len(),
        source
    );
    AppError::TeardownFailed(Box::new(TeardownFailure {
        tenant,
        executed,
        failed,
        not_attempted,
        source,
    }))
}

/// Count tables and sequences carrying the map's suffix.
///
/// Reads the catalog rather than probing the expected names, so stray objects
/// left by a partial create or drop are counted too.
pub async fn count_tenant_objects<C: SchemaCatalog>(catalog: &C, tenant: TenantId) -> Result<i64> {
    let tables = catalog
        .count_tables_with_suffix(&format!("_{tenant}"))
        .await?;
    let sequences = catalog
        .count_sequences_with_suffix(&format!("_{tenant}{SEQUENCE_SUFFIX}"))
        .await?;
    Ok(tables + sequences)
}

/// Expected tables for a map that are not present
pub async fn missing_tables<C: SchemaCatalog>(catalog: &C, tenant: TenantId) -> Result<Vec<String>> {
    let expected = all_table_names(tenant);
    let existing = catalog.existing_tables(&expected).await?;
    Ok(expected
        .into_iter()
        .filter(|name| !existing.contains(name))
        .collect())
}

/// Expected id sequences for a map that are not present
pub async fn missing_sequences<C: SchemaCatalog>(
    catalog: &C,
    tenant: TenantId,
) -> Result<Vec<String>> {
    let expected = all_sequence_names(tenant);
    let existing = catalog.existing_sequences(&expected).await?;
    Ok(expected
        .into_iter()
        .filter(|name| !existing.contains(name))
        .collect())
}

/// List tables named `<prefix>_...`. Hyphens in the prefix are read as underscores.
pub async fn list_tables_by_prefix<C: SchemaCatalog>(catalog: &C, prefix: &str) -> Result<Vec<String>> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(AppError::InvalidInput("A table prefix must be specified".to_string()));
    }
    catalog
        .tables_with_prefix(&format!("{}_", prefix.replace('-', "_")))
        .await
}

/// Escape LIKE wildcards so `s` matches literally
pub fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl DdlSession for sqlx::Transaction<'static, sqlx::Postgres> {
    async fn run(&mut self, statement: &DdlStatement) -> Result<()> {
        sqlx::query(&statement.sql).execute(&mut **self).await?;
        Ok(())
    }

    async fn finish(self) -> Result<()> {
        self.commit().await?;
        Ok(())
    }
}

impl SchemaCatalog for PgStore {
    type Session = sqlx::Transaction<'static, sqlx::Postgres>;

    fn schema_name(&self) -> &str {
        self.schema().schema()
    }

    async fn begin(&self) -> Result<Self::Session> {
        Ok(self.pool().begin().await?)
    }

    async fn count_tables_with_suffix(&self, suffix: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name LIKE $2",
        )
        .bind(self.schema_name())
        .bind(format!("%{}", escape_like(suffix)))
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn count_sequences_with_suffix(&self, suffix: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM information_schema.sequences \
             WHERE sequence_schema = $1 AND sequence_name LIKE $2",
        )
        .bind(self.schema_name())
        .bind(format!("%{}", escape_like(suffix)))
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn tables_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name LIKE $2 \
             ORDER BY table_name",
        )
        .bind(self.schema_name())
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(self.pool())
        .await?;
        Ok(tables)
    }

    async fn existing_tables(&self, names: &[String]) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name = ANY($2)",
        )
        .bind(self.schema_name())
        .bind(names)
        .fetch_all(self.pool())
        .await?;
        Ok(tables)
    }

    async fn existing_sequences(&self, names: &[String]) -> Result<Vec<String>> {
        let sequences = sqlx::query_scalar::<_, String>(
            "SELECT sequence_name::text FROM information_schema.sequences \
             WHERE sequence_schema = $1 AND sequence_name = ANY($2)",
        )
        .bind(self.schema_name())
        .bind(names)
        .fetch_all(self.pool())
        .await?;
        Ok(sequences)
    }

    async fn table_size_bytes(&self, name: &str) -> Result<i64> {
        let qualified = format!(
            "{}.{}",
            quote_ident(self.schema_name()),
            quote_ident(name)
        );
        let size = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(pg_total_relation_size(to_regclass($1)), 0)::bigint",
        )
        .bind(qualified)
        .fetch_one(self.pool())
        .await?;
        Ok(size)
    }
}
