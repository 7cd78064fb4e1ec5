use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::constants::TENANT_OBJECT_COUNT;
use crate::db::lifecycle::{count_tenant_objects, drop_tenant, list_tables_by_prefix, DropReport};
use crate::db::TenantId;
use crate::error::{AppError, Result};
use crate::AppState;

/// Query parameters for admin endpoints
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin secret key for authentication
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct TablesQuery {
    pub key: String,
    pub prefix: String,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TenantObjectsResponse {
    pub tenant: TenantId,
    pub objects: i64,
    pub expected: i64,
}

fn check_admin_key(state: &AppState, key: &str) -> Result<()> {
    // Admin endpoints are disabled unless a key is configured
    let admin_key = state
        .config
        .admin_secret_key
        .as_ref()
        .ok_or(AppError::Unauthorized)?;

    if key != admin_key {
        tracing::warn!("Invalid admin key attempt");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// List tables by name prefix
///
/// GET /api/admin/tables?prefix=<prefix>&key=<admin_secret_key>
pub async fn list_tables(
    State(state): State<AppState>,
    Query(params): Query<TablesQuery>,
) -> Result<Json<TablesResponse>> {
    check_admin_key(&state, &params.key)?;

    let tables = list_tables_by_prefix(&state.store, &params.prefix).await?;
    Ok(Json(TablesResponse { tables }))
}

/// Count a map's tables and sequences, registered or not
///
/// GET /api/admin/tenants/:id/objects?key=<admin_secret_key>
pub async fn tenant_objects(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<TenantObjectsResponse>> {
    check_admin_key(&state, &params.key)?;

    let tenant = TenantId::new(id)?;
    let objects = count_tenant_objects(&state.store, tenant).await?;

    if objects != 0 && objects != TENANT_OBJECT_COUNT {
        tracing::warn!(
            "Map {} has {} table objects, expected {}",
            tenant,
            objects,
            TENANT_OBJECT_COUNT
        );
    }

    Ok(Json(TenantObjectsResponse {
        tenant,
        objects,
        expected: TENANT_OBJECT_COUNT,
    }))
}

/// Drop a map's tables without touching the registry, for orphan cleanup
///
/// DELETE /api/admin/tenants/:id?key=<admin_secret_key>
pub async fn drop_tenant_tables(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<DropReport>> {
    check_admin_key(&state, &params.key)?;

    let report = drop_tenant(&state.store, TenantId::new(id)?).await?;
    tracing::info!("Admin dropped tables for map {}", id);
    Ok(Json(report))
}
