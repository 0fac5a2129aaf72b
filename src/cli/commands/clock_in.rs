use crate::cli::commands::{describe_skip, open_tracker};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::tracker::{ClockInInput, OpOutcome};
use crate::errors::AppResult;
use crate::models::project_time::ProjectTime;
use crate::ui::messages::{info, success, warning};
use crate::utils::time::format_time_display;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::In { note, projects } = cmd {
        // parse before touching the store
        let projects = projects
            .iter()
            .map(|p| ProjectTime::parse(p))
            .collect::<AppResult<Vec<_>>>()?;

        let tracker = open_tracker(cfg).await?;

        let input = ClockInInput {
            notes: note.clone().unwrap_or_default(),
            projects,
        };

        match tracker.clock_in(input).await? {
            OpOutcome::Applied(session) => {
                success(format!(
                    "Clocked in at {} (session {}).",
                    format_time_display(session.clock_in),
                    session.id
                ));
                info(format!(
                    "Expected end of day: {}",
                    format_time_display(tracker.policy().expected_clock_out_time(session.clock_in))
                ));
            }
            OpOutcome::Skipped(reason) => warning(describe_skip(reason)),
        }
    }

    Ok(())
}
