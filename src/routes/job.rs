use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::job_status::get_status;
use crate::models::JobStatusView;
use crate::routes::Requester;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JobStatusParams {
    #[serde(rename = "includeCommandDetail", default)]
    pub include_command_detail: bool,
}

/// Status of a job launched by the requester
///
/// GET /api/job/status/:job_id?includeCommandDetail=true
///
/// Unknown job ids answer `"status": "unknown"` with 200. Jobs owned by
/// another user answer 403.
pub async fn job_status(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(job_id): Path<String>,
    Query(params): Query<JobStatusParams>,
) -> Result<Json<JobStatusView>> {
    let view = get_status(
        &state.store,
        &job_id,
        user_id,
        params.include_command_detail,
    )
    .await?;
    Ok(Json(view))
}
