use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::lifecycle::{
    count_tenant_objects, create_tenant, drop_tenant, missing_sequences, missing_tables,
};
use crate::db::{resolve, TenantId, MAPS};
use crate::error::{AppError, Result};
use crate::models::{format_bytes, validate_tags, ElementCounts, MapRecord, MapTags};
use crate::routes::Requester;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMapRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfoResponse {
    #[serde(flatten)]
    pub map: MapRecord,
    pub tags: MapTags,
    /// Whether all six map tables and four id sequences exist
    pub consistent: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_tables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_sequences: Vec<String>,
    /// Tables and sequences carrying this map's suffix
    pub table_objects: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<ElementCounts>,
    pub size_bytes: i64,
    pub size_human: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMapResponse {
    pub success: bool,
    pub dropped: Vec<String>,
}

/// Register a map and create its private tables
///
/// POST /api/maps {"name": "..."}
pub async fn create_map(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Json(payload): Json<CreateMapRequest>,
) -> Result<Json<MapRecord>> {
    let name = payload.name.trim();
    MapRecord::validate_name(name).map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    let map = state.store.insert_map(name, user_id).await?;
    let tenant = TenantId::new(map.id)?;

    if let Err(e) = create_tenant(&state.store, tenant).await {
        tracing::error!("Provisioning tables for map {} failed: {}", map.id, e);
        if let Err(cleanup) = state.store.delete_map(map.id).await {
            tracing::error!("Removing registry row for map {} failed: {}", map.id, cleanup);
        }
        return Err(e);
    }

    tracing::info!("Created map {} for user {}", map.id, user_id);
    Ok(Json(map))
}

/// Registry entry plus the state of the map's tables
///
/// GET /api/maps/:map (id or name)
///
/// A map missing any table or sequence is reported with `consistent: false`.
/// Element counts are left out when a table is missing.
pub async fn map_info(
    State(state): State<AppState>,
    Path(map): Path<String>,
) -> Result<Json<MapInfoResponse>> {
    let id = resolve(&state.store, &map, &MAPS).await?;
    let map = state.store.find_map(id).await?;
    let tenant = TenantId::new(map.id)?;

    let tags = state.store.map_tags(map.id).await?;
    let missing_tables = missing_tables(&state.store, tenant).await?;
    let missing_sequences = missing_sequences(&state.store, tenant).await?;
    let table_objects = count_tenant_objects(&state.store, tenant).await?;

    let elements = if missing_tables.is_empty() {
        let overlay = state.store.schema().for_tenant(tenant);
        Some(state.store.count_elements(&overlay).await?)
    } else {
        tracing::warn!(
            "Map {} is missing {} of its tables",
            tenant,
            missing_tables.len()
        );
        None
    };

    let size_bytes = state.store.tenant_size_bytes(tenant).await?;

    Ok(Json(MapInfoResponse {
        map,
        tags,
        consistent: missing_tables.is_empty() && missing_sequences.is_empty(),
        missing_tables,
        missing_sequences,
        table_objects,
        elements,
        size_bytes,
        size_human: format_bytes(size_bytes.max(0) as u64),
    }))
}

/// Merge tags into a map's tags
///
/// PUT /api/maps/:map/tags {"key": "value", ...}
///
/// Only the owner may change tags. Keys already present are overwritten,
/// other existing keys are kept. Returns the merged tags.
pub async fn merge_tags(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(map): Path<String>,
    Json(tags): Json<MapTags>,
) -> Result<Json<MapTags>> {
    validate_tags(&tags).map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    let id = resolve(&state.store, &map, &MAPS).await?;
    let map = state.store.find_map(id).await?;
    if map.user_id != user_id {
        tracing::warn!("User {} denied tag update on map {}", user_id, map.id);
        return Err(AppError::Forbidden);
    }

    let merged = state.store.merge_map_tags(map.id, &tags).await?;
    tracing::debug!("Merged {} tags into map {}", tags.len(), map.id);
    Ok(Json(merged))
}

/// Drop a map's tables and remove it from the registry
///
/// DELETE /api/maps/:map (id or name)
///
/// Only the owner may delete. Tables are dropped before the registry row, so
/// a failed call can be repeated.
pub async fn delete_map(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(map): Path<String>,
) -> Result<Json<DeleteMapResponse>> {
    let id = resolve(&state.store, &map, &MAPS).await?;
    let map = state.store.find_map(id).await?;

    if map.user_id != user_id {
        tracing::warn!("User {} denied deletion of map {}", user_id, map.id);
        return Err(AppError::Forbidden);
    }

    let report = drop_tenant(&state.store, TenantId::new(map.id)?).await?;
    state.store.delete_map(map.id).await?;

    tracing::info!("Deleted map {}", map.id);
    Ok(Json(DeleteMapResponse {
        success: true,
        dropped: report.dropped,
    }))
}
