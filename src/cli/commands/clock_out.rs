use crate::cli::commands::{describe_skip, open_tracker};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::tracker::OpOutcome;
use crate::errors::AppResult;
use crate::models::project_time::SessionNotes;
use crate::ui::messages::{confirm, info, success, warning};
use crate::utils::formatting::{format_time, hours2readable};
use crate::utils::time::format_time_display;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Out { note, yes } = cmd {
        let tracker = open_tracker(cfg).await?;

        let request = match tracker.clock_out() {
            OpOutcome::Applied(r) => r,
            OpOutcome::Skipped(reason) => {
                warning(describe_skip(reason));
                return Ok(());
            }
        };

        info(format!(
            "Session {} started at {}: worked {} ({} min).",
            request.session_id,
            format_time_display(request.clock_in),
            format_time(request.elapsed_seconds),
            request.duration_minutes
        ));

        if !*yes && !confirm("Clock out now?")? {
            info("Clock-out cancelled, the session stays open.");
            return Ok(());
        }

        let notes = note
            .as_ref()
            .map(|text| SessionNotes::new(text.clone(), request.notes.projects.clone()));
        let submission = request.into_submission(notes)?;

        match tracker.submit_clock_out(submission).await? {
            OpOutcome::Applied(session) => success(format!(
                "Clocked out (session {}, {}).",
                session.id,
                hours2readable(session.total_hours)
            )),
            OpOutcome::Skipped(reason) => warning(describe_skip(reason)),
        }
    }

    Ok(())
}
