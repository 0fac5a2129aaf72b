//! Elapsed work time of a session, derived from stored timestamps.
//!
//! Nothing here is persisted: the value is recomputed from `clock_in` and the
//! break records every time, so it survives restarts without drifting.

use crate::models::session::{Break, Session};
use crate::utils::time::seconds_between;
use chrono::{DateTime, Utc};

/// Seconds a single break removes from work time at `now`.
///
/// - closed with a stored duration → that duration (authoritative)
/// - closed without a duration    → `end - start`
/// - still open                   → `now - start`
pub fn break_seconds(b: &Break, now: DateTime<Utc>) -> i64 {
    match (b.end, b.duration_minutes) {
        (Some(_), Some(minutes)) => minutes.max(0) * 60,
        (Some(end), None) => seconds_between(b.start, end),
        (None, _) => seconds_between(b.start, now),
    }
}

pub fn total_break_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    session.breaks.iter().map(|b| break_seconds(b, now)).sum()
}

/// Wall-clock seconds since clock-in, up to clock-out for closed sessions.
pub fn wall_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    let end = session.clock_out.unwrap_or(now);
    seconds_between(session.clock_in, end)
}

/// `(now - clock_in) - Σ breaks`, never negative.
pub fn elapsed_work_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    let end = session.clock_out.unwrap_or(now);
    (wall_seconds(session, now) - total_break_seconds(session, end)).max(0)
}
