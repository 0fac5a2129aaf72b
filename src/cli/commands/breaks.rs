use crate::cli::commands::{describe_skip, open_tracker};
use crate::cli::parser::{BreakAction, Commands};
use crate::config::Config;
use crate::core::tracker::OpOutcome;
use crate::errors::{AppError, AppResult};
use crate::models::break_kind::BreakKind;
use crate::ui::messages::{success, warning};
use crate::utils::time::format_time_display;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Break { action } = cmd else {
        return Ok(());
    };

    match action {
        BreakAction::Start { kind } => {
            let code = kind.as_deref().unwrap_or(cfg.default_break_kind.as_str());
            let kind =
                BreakKind::from_code(code).ok_or_else(|| AppError::InvalidBreakKind(code.into()))?;

            let tracker = open_tracker(cfg).await?;
            match tracker.start_break(kind).await? {
                OpOutcome::Applied(b) => success(format!(
                    "{} started at {}.",
                    b.kind.label(),
                    format_time_display(b.start)
                )),
                OpOutcome::Skipped(reason) => warning(describe_skip(reason)),
            }
        }
        BreakAction::End => {
            let tracker = open_tracker(cfg).await?;
            match tracker.end_break().await? {
                OpOutcome::Applied(break_id) => {
                    let minutes = tracker
                        .snapshot()
                        .current
                        .and_then(|s| s.breaks.into_iter().find(|b| b.id == break_id))
                        .and_then(|b| b.duration_minutes);
                    match minutes {
                        Some(m) => success(format!("Break ended after {} min.", m)),
                        None => success("Break ended."),
                    }
                }
                OpOutcome::Skipped(reason) => warning(describe_skip(reason)),
            }
        }
    }

    Ok(())
}
