use super::{JobApi, JobState, ValidationRequest};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<String>,
}

/// `JobApi` over the validation proxy's REST endpoints.
pub struct HttpJobApi {
    client: Client,
    base_url: String,
}

impl HttpJobApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(AppError::JobApi {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, request: &ValidationRequest) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("validate"))
            .json(request)
            .send()
            .await?;

        let body: SubmitResponse = Self::check(response)?.json().await?;
        tracing::info!(job_id = %body.job_id, candidate = %request.candidate_id, "validation job submitted");
        Ok(body.job_id)
    }

    async fn status(&self, job_id: &str) -> AppResult<JobState> {
        let response = self
            .client
            .get(self.url(&format!("jobs/{job_id}")))
            .send()
            .await?;

        Ok(Self::check(response)?.json().await?)
    }

    async fn logs(&self, job_id: &str) -> AppResult<Vec<String>> {
        let response = self
            .client
            .get(self.url(&format!("jobs/{job_id}/logs")))
            .send()
            .await?;

        let body: LogsResponse = Self::check(response)?.json().await?;
        Ok(body.logs)
    }
}
