pub mod breaks;
pub mod clock_in;
pub mod clock_out;
pub mod config;
pub mod db;
pub mod export;
pub mod init;
pub mod job;
pub mod list;
pub mod log;
pub mod status;
pub mod watch;

use crate::config::Config;
use crate::core::calculator::expected::GracePolicy;
use crate::core::clock::{Clock, SystemClock};
use crate::core::tracker::{SkipReason, TimeTracker};
use crate::db::gateway::SqliteGateway;
use crate::errors::AppResult;
use crate::models::employee::EmployeeKey;
use crate::ui::notifier::ConsoleNotifier;
use std::sync::Arc;

/// Build a tracker over the configured database and load the selected
/// employee. Loading also closes a session whose grace period is over.
pub(crate) async fn open_tracker(cfg: &Config) -> AppResult<Arc<TimeTracker>> {
    let employee_id = cfg.resolve_employee(None)?;
    let policy = GracePolicy::from_config(cfg)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = SqliteGateway::open(&cfg.database, Arc::clone(&clock))?;

    let tracker = Arc::new(TimeTracker::new(
        cfg.organization_id.clone(),
        Arc::new(gateway),
        clock,
        Arc::new(ConsoleNotifier),
        policy,
    ));

    tracker.load_employee(&employee_id).await?;
    Ok(tracker)
}

pub(crate) fn employee_key(cfg: &Config) -> AppResult<EmployeeKey> {
    Ok(EmployeeKey::new(
        cfg.organization_id.clone(),
        cfg.resolve_employee(None)?,
    ))
}

pub(crate) fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Busy => "Another operation is still in progress.",
        SkipReason::NoEmployee => "No employee selected.",
        SkipReason::AlreadyTracking => "You are already clocked in.",
        SkipReason::NoOpenSession => "You are not clocked in.",
        SkipReason::AlreadyOnBreak => "A break is already running.",
        SkipReason::NoOpenBreak => "No break is running.",
    }
}
