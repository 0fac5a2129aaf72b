//! Resume-validation jobs on a remote proxy: submit, poll until the job
//! settles, and pull its logs when it fails.

pub mod http;

use crate::core::poll::{PollOptions, PollOutcome, poll_until};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
    /// 0..=100 when the server reports it.
    #[serde(default)]
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRequest {
    pub candidate_id: String,
    pub resume_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub job_id: String,
    pub state: JobState,
    /// Only fetched for failed jobs.
    pub logs: Vec<String>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.state.status == JobStatus::Completed
    }
}

#[async_trait]
pub trait JobApi: Send + Sync {
    /// Returns the new job id.
    async fn submit(&self, request: &ValidationRequest) -> AppResult<String>;

    async fn status(&self, job_id: &str) -> AppResult<JobState>;

    async fn logs(&self, job_id: &str) -> AppResult<Vec<String>>;
}

/// Poll `job_id` until it completes or fails.
pub async fn wait_for_job(
    api: &dyn JobApi,
    job_id: &str,
    options: PollOptions,
    cancel: watch::Receiver<bool>,
) -> AppResult<JobReport> {
    let outcome = poll_until(
        options,
        cancel,
        || async move {
            let state = api.status(job_id).await?;
            tracing::debug!(job_id, status = state.status.as_str(), progress = ?state.progress, "job polled");
            Ok(state)
        },
        |state| state.status.is_terminal(),
    )
    .await?;

    let state = match outcome {
        PollOutcome::Terminal(state) => state,
        PollOutcome::Exhausted(last) => {
            tracing::warn!(job_id, status = last.status.as_str(), "job still not settled");
            return Err(AppError::JobTimeout(job_id.to_string()));
        }
        PollOutcome::Cancelled => return Err(AppError::Cancelled),
    };

    let logs = if state.status == JobStatus::Failed {
        match api.logs(job_id).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(job_id, "could not fetch job logs: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(JobReport {
        job_id: job_id.to_string(),
        state,
        logs,
    })
}
