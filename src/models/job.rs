use chrono::{DateTime, Utc};
use serde::Serialize;

/// Job state as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Success,
    Failed,
    Cancelled,
    Unknown,
}

impl JobState {
    /// Map the integer stored in `job_status.status`
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => JobState::Running,
            1 => JobState::Success,
            2 => JobState::Failed,
            3 => JobState::Cancelled,
            _ => JobState::Unknown,
        }
    }
}

/// Row of the `job_status` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobStatusRecord {
    pub job_id: String,
    /// Owning user
    pub user_id: i64,
    pub status: i32,
    pub status_detail: Option<String>,
    pub percent_complete: i32,
}

/// One lower-level command executed for a job
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: i64,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub start: DateTime<Utc>,
    pub finish: Option<DateTime<Utc>>,
}

/// Job status response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_detail: Option<Vec<CommandRecord>>,
}

impl JobStatusView {
    /// View for a job id with no visible record
    pub fn unknown(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobState::Unknown,
            status_detail: None,
            percent_complete: None,
            last_text: None,
            command_detail: None,
        }
    }

    pub fn from_record(record: JobStatusRecord) -> Self {
        Self {
            status: JobState::from_code(record.status),
            last_text: record.status_detail.clone(),
            status_detail: record.status_detail,
            percent_complete: Some(record.percent_complete),
            command_detail: None,
            job_id: record.job_id,
        }
    }
}
