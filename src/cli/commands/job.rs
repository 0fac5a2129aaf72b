use crate::cli::parser::{Commands, JobAction};
use crate::config::Config;
use crate::core::poll::PollOptions;
use crate::errors::AppResult;
use crate::jobs::http::HttpJobApi;
use crate::jobs::{JobApi, ValidationRequest, wait_for_job};
use crate::ui::messages::{error, info, success};
use std::time::Duration;
use tokio::sync::watch;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Job { action } = cmd else {
        return Ok(());
    };

    let api = HttpJobApi::new(cfg.job_api_url.clone());

    match action {
        JobAction::Submit {
            candidate,
            resume_url,
            wait,
        } => {
            let request = ValidationRequest {
                candidate_id: candidate.clone(),
                resume_url: resume_url.clone(),
            };
            let job_id = api.submit(&request).await?;
            success(format!("Validation job submitted: {}", job_id));

            if *wait {
                wait_and_report(&api, &job_id, cfg).await?;
            }
        }
        JobAction::Wait { job_id } => wait_and_report(&api, job_id, cfg).await?,
    }

    Ok(())
}

async fn wait_and_report(api: &HttpJobApi, job_id: &str, cfg: &Config) -> AppResult<()> {
    let options = PollOptions::every(Duration::from_secs(cfg.job_poll_seconds.max(1)))
        .with_max_attempts(cfg.job_max_attempts);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    info(format!("Waiting for job {}…", job_id));
    let report = wait_for_job(api, job_id, options, cancel_rx).await;
    ctrl_c.abort();
    let report = report?;

    if report.succeeded() {
        success(format!(
            "Job {} completed{}",
            report.job_id,
            report
                .state
                .message
                .as_ref()
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        ));
    } else {
        error(format!(
            "Job {} failed{}",
            report.job_id,
            report
                .state
                .message
                .as_ref()
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        ));
        for line in &report.logs {
            println!("    {}", line);
        }
    }

    Ok(())
}
