use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::utils::time::parse_work_duration;
use chrono::{DateTime, TimeDelta, Utc};

/// Longest expected day plus allowance a configuration may ask for.
const MAX_POLICY_SPAN: TimeDelta = TimeDelta::days(7);

/// Where a running session stands against the working-hours policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GracePhase {
    /// Before the expected working duration.
    Normal,
    /// Past the expected duration, inside the allowance.
    Grace,
    /// Past expected + allowance: eligible for forced closure.
    Ended,
}

/// Organization working-hours policy.
///
/// Expected = start + working duration; the grace period runs from there
/// for `allowance`, after which the session is auto-terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePolicy {
    pub expected_work: TimeDelta,
    pub allowance: TimeDelta,
}

impl Default for GracePolicy {
    fn default() -> Self {
        Self {
            expected_work: TimeDelta::hours(8),
            allowance: TimeDelta::minutes(30),
        }
    }
}

impl GracePolicy {
    pub fn new(expected_work: TimeDelta, allowance: TimeDelta) -> Self {
        Self {
            expected_work,
            allowance,
        }
    }

    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        let expected_work = parse_work_duration(&cfg.expected_work_duration)?;

        if cfg.grace_allowance_minutes < 0 {
            return Err(AppError::InvalidDuration(format!(
                "grace_allowance_minutes must not be negative (got {})",
                cfg.grace_allowance_minutes
            )));
        }

        let allowance = TimeDelta::try_minutes(cfg.grace_allowance_minutes).ok_or_else(|| {
            AppError::InvalidDuration(format!(
                "grace_allowance_minutes out of range (got {})",
                cfg.grace_allowance_minutes
            ))
        })?;

        let span = expected_work.checked_add(&allowance);
        if span.is_none_or(|span| span > MAX_POLICY_SPAN) {
            return Err(AppError::InvalidDuration(format!(
                "expected_work_duration + grace allowance must not exceed {} days (got {} + {} min)",
                MAX_POLICY_SPAN.num_days(),
                cfg.expected_work_duration,
                cfg.grace_allowance_minutes
            )));
        }

        Ok(Self::new(expected_work, allowance))
    }

    pub fn expected_clock_out_time(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_signed(self.expected_work)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Instant after which the session gets auto-terminated.
    pub fn grace_deadline(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        self.expected_clock_out_time(start)
            .checked_add_signed(self.allowance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_within_grace_period(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.phase(start, now) == GracePhase::Grace
    }

    pub fn has_grace_period_ended(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.phase(start, now) == GracePhase::Ended
    }

    pub fn phase(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> GracePhase {
        if now >= self.grace_deadline(start) {
            GracePhase::Ended
        } else if now >= self.expected_clock_out_time(start) {
            GracePhase::Grace
        } else {
            GracePhase::Normal
        }
    }
}
