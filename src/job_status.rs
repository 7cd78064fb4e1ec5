//! Read path over job status records with owner-only visibility.

use std::future::Future;

use crate::db::PgStore;
use crate::error::{AppError, Result};
use crate::models::{CommandRecord, JobStatusRecord, JobStatusView};

/// Storage backing job status lookups
pub trait JobStatusStore: Sync {
    fn find_by_id(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<Option<JobStatusRecord>>> + Send;

    /// Commands run for a job, oldest first
    fn find_command_detail(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<Vec<CommandRecord>>> + Send;
}

/// Status of `job_id` as seen by `requester`.
///
/// An unknown job id is a normal outcome and yields an `unknown` view. A job
/// owned by someone else yields [`AppError::Forbidden`] and nothing else, so the
/// response never reveals whose job it is.
pub async fn get_status<S: JobStatusStore>(
    store: &S,
    job_id: &str,
    requester: i64,
    include_detail: bool,
) -> Result<JobStatusView> {
    if job_id.trim().is_empty() {
        return Err(AppError::InvalidInput("A job ID must be specified".to_string()));
    }

    let Some(record) = store.find_by_id(job_id).await? else {
        tracing::debug!("No job status found for job {}", job_id);
        return Ok(JobStatusView::unknown(job_id));
    };

    if record.user_id != requester {
        tracing::warn!("User {} denied access to job {}", requester, job_id);
        return Err(AppError::Forbidden);
    }

    let mut view = JobStatusView::from_record(record);
    if include_detail {
        view.command_detail = Some(store.find_command_detail(job_id).await?);
    }
    Ok(view)
}

impl JobStatusStore for PgStore {
    async fn find_by_id(&self, job_id: &str) -> Result<Option<JobStatusRecord>> {
        let sql = self.schema().shared().render(
            "SELECT job_id, user_id, status, status_detail, percent_complete \
             FROM {job_status} WHERE job_id = $1",
        );
        let record = sqlx::query_as::<_, JobStatusRecord>(&sql)
            .bind(job_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(record)
    }

    async fn find_command_detail(&self, job_id: &str) -> Result<Vec<CommandRecord>> {
        let sql = self.schema().shared().render(
            "SELECT id, command, exit_code, stdout, stderr, start, finish \
             FROM {command_status} WHERE job_id = $1 ORDER BY id",
        );
        let commands = sqlx::query_as::<_, CommandRecord>(&sql)
            .bind(job_id)
            .fetch_all(self.pool())
            .await?;
        Ok(commands)
    }
}
