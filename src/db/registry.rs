//! Queries against the shared `users` and `maps` tables, plus element counts
//! read through a map's overlay.

use sqlx::types::Json;

use super::lifecycle::SchemaCatalog;
use super::overlay::QueryConfig;
use super::tables::{all_table_names, TenantId, MAPS, USERS};
use super::PgStore;
use crate::error::{AppError, Result};
use crate::models::{ElementCounts, MapRecord, MapTags, User};

impl PgStore {
    /// Fetch the user with `email`, creating it first if needed
    pub async fn get_or_create_user(&self, email: &str) -> Result<User> {
        // the no-op update makes RETURNING yield the existing row on conflict
        let sql = self.schema().shared().render(
            "INSERT INTO {users} (email, display_name) VALUES ($1, $1) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id, email, display_name, created_at",
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_one(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Result<User> {
        let sql = self
            .schema()
            .shared()
            .render("SELECT id, email, display_name, created_at FROM {users} WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| AppError::not_found_id(USERS.entity, id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let sql = self
            .schema()
            .shared()
            .render("SELECT id, email, display_name, created_at FROM {users} ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(users)
    }

    pub async fn insert_map(&self, name: &str, owner: i64) -> Result<MapRecord> {
        let sql = self.schema().shared().render(
            "INSERT INTO {maps} (display_name, user_id) VALUES ($1, $2) \
             RETURNING id, display_name, user_id, public, created_at",
        );
        let map = sqlx::query_as::<_, MapRecord>(&sql)
            .bind(name)
            .bind(owner)
            .fetch_one(self.pool())
            .await?;
        Ok(map)
    }

    pub async fn find_map(&self, id: i64) -> Result<MapRecord> {
        let sql = self.schema().shared().render(
            "SELECT id, display_name, user_id, public, created_at FROM {maps} WHERE id = $1",
        );
        sqlx::query_as::<_, MapRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| AppError::not_found_id(MAPS.entity, id))
    }

    /// Remove a map from the registry. Returns false when it was already gone.
    pub async fn delete_map(&self, id: i64) -> Result<bool> {
        let sql = self
            .schema()
            .shared()
            .render("DELETE FROM {maps} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(self.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn map_tags(&self, id: i64) -> Result<MapTags> {
        let sql = self
            .schema()
            .shared()
            .render("SELECT tags FROM {maps} WHERE id = $1");
        sqlx::query_scalar::<_, Json<MapTags>>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(|Json(tags)| tags)
            .ok_or_else(|| AppError::not_found_id(MAPS.entity, id))
    }

    /// Merge `tags` into a map's tags and return the result.
    ///
    /// Existing keys not named in `tags` are kept; colliding keys take the new value.
    pub async fn merge_map_tags(&self, id: i64, tags: &MapTags) -> Result<MapTags> {
        let sql = self
            .schema()
            .shared()
            .render("UPDATE {maps} SET tags = tags || $2 WHERE id = $1 RETURNING tags");
        sqlx::query_scalar::<_, Json<MapTags>>(&sql)
            .bind(id)
            .bind(Json(tags))
            .fetch_optional(self.pool())
            .await?
            .map(|Json(tags)| tags)
            .ok_or_else(|| AppError::not_found_id(MAPS.entity, id))
    }

    /// Count elements in a map's own tables.
    ///
    /// The overlay must be tenant scoped; counting through the shared overlay
    /// would read the canonical tables instead.
    pub async fn count_elements(&self, overlay: &QueryConfig<'_>) -> Result<ElementCounts> {
        if overlay.tenant().is_none() {
            return Err(AppError::InvalidInput(
                "Element counts require a map scope".to_string(),
            ));
        }
        let sql = overlay.render(
            "SELECT (SELECT count(*) FROM {current_nodes}) AS nodes, \
                    (SELECT count(*) FROM {current_ways}) AS ways, \
                    (SELECT count(*) FROM {current_relations}) AS relations",
        );
        let counts = sqlx::query_as::<_, ElementCounts>(&sql)
            .fetch_one(self.pool())
            .await?;
        Ok(counts)
    }

    /// Total size in bytes of the map tables that exist
    pub async fn tenant_size_bytes(&self, tenant: TenantId) -> Result<i64> {
        let mut total = 0;
        for name in all_table_names(tenant) {
            total += self.table_size_bytes(&name).await?;
        }
        Ok(total)
    }
}
