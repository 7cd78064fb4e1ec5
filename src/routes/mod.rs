pub mod admin;
pub mod health;
pub mod job;
pub mod map;
pub mod requester;
pub mod user;

pub use admin::{drop_tenant_tables, list_tables, tenant_objects};
pub use health::health_check;
pub use job::job_status;
pub use map::{create_map, delete_map, map_info, merge_tags};
pub use requester::Requester;
pub use user::{get_user, list_users, save_user};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the API router with all routes and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/job/status/:job_id", get(job_status))
        .route("/api/user", post(save_user))
        .route("/api/user/:user", get(get_user))
        .route("/api/users", get(list_users))
        .route("/api/maps", post(create_map))
        .route("/api/maps/:map", get(map_info).delete(delete_map))
        .route("/api/maps/:map/tags", put(merge_tags))
        .route("/api/admin/tables", get(list_tables))
        .route("/api/admin/tenants/:id", delete(drop_tenant_tables))
        .route("/api/admin/tenants/:id/objects", get(tenant_objects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
