//! Persistence API the tracker talks to.
//!
//! The store owns sessions and breaks; the tracker only mirrors them. The
//! store, not the client, enforces "one open session per employee" and
//! "one open break per session".

use crate::errors::AppResult;
use crate::models::break_kind::BreakKind;
use crate::models::employee::EmployeeKey;
use crate::models::project_time::ProjectTime;
use crate::models::session::{Break, Session};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct ClockInRequest {
    pub employee: EmployeeKey,
    /// Already encoded; see `SessionNotes::encode`.
    pub notes: String,
    pub project_time: Vec<ProjectTime>,
    pub total_hours: f64,
}

/// Final close of a session, produced by the clock-out confirmation step.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockOutSubmission {
    pub session_id: i64,
    pub employee: EmployeeKey,
    pub duration_minutes: i64,
    /// Already encoded; see `SessionNotes::encode`.
    pub notes: String,
    pub total_hours: f64,
}

#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// The employee's open session, with its breaks, if any.
    async fn check_active_time_log(&self, employee: &EmployeeKey) -> AppResult<Option<Session>>;

    /// Every session of the employee, newest first.
    async fn fetch_time_logs(&self, employee: &EmployeeKey) -> AppResult<Vec<Session>>;

    async fn clock_in(&self, request: &ClockInRequest) -> AppResult<Session>;

    async fn clock_out(&self, submission: &ClockOutSubmission) -> AppResult<Session>;

    async fn start_break(&self, session_id: i64, kind: BreakKind) -> AppResult<Break>;

    /// `false` when there was no open break with that id.
    async fn end_break(&self, break_id: i64) -> AppResult<bool>;

    /// Force-close an open session. `false` when it was already closed.
    async fn auto_terminate_time_log(&self, session_id: i64, elapsed_seconds: i64)
    -> AppResult<bool>;
}
