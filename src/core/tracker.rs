//! Time-tracking facade: reconciliation, clock-in/out, breaks and the grace
//! check, over a `SessionGateway`.
//!
//! Local state is a snapshot of the store. It sits behind a std mutex that is
//! never held across an `.await`: every remote call runs unlocked and its
//! result is applied only if the selected employee (and load generation) is
//! still the one the call was made for.

use crate::core::calculator::elapsed::elapsed_work_seconds;
use crate::core::calculator::expected::GracePolicy;
use crate::core::clock::Clock;
use crate::core::gateway::{ClockInRequest, ClockOutSubmission, SessionGateway};
use crate::core::monitor::{GraceAction, GraceMonitor};
use crate::core::state::SessionState;
use crate::errors::{AppError, AppResult};
use crate::models::break_kind::BreakKind;
use crate::models::employee::EmployeeKey;
use crate::models::project_time::{ProjectTime, SessionNotes};
use crate::models::session::{Break, Session};
use crate::ui::notifier::Notifier;
use crate::utils::time::format_time_display;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Why an operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another clock-in/clock-out submission is still running.
    Busy,
    NoEmployee,
    AlreadyTracking,
    NoOpenSession,
    AlreadyOnBreak,
    NoOpenBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome<T> {
    Applied(T),
    Skipped(SkipReason),
}

impl<T> OpOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            OpOutcome::Applied(v) => Some(v),
            OpOutcome::Skipped(_) => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, OpOutcome::Applied(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// A load for the same employee is already in flight.
    AlreadyLoading,
    /// The selection moved on while this load was in flight; result dropped.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClockInInput {
    pub notes: String,
    pub projects: Vec<ProjectTime>,
}

/// What clock-out hands to the confirmation step. Nothing is closed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockOutRequest {
    pub session_id: i64,
    pub employee: EmployeeKey,
    pub clock_in: DateTime<Utc>,
    pub elapsed_seconds: i64,
    /// Whole minutes, truncated.
    pub duration_minutes: i64,
    pub notes: SessionNotes,
}

impl ClockOutRequest {
    /// Build the store submission, optionally replacing the notes.
    pub fn into_submission(self, notes: Option<SessionNotes>) -> AppResult<ClockOutSubmission> {
        let notes = notes.unwrap_or(self.notes);
        let total_hours = if notes.projects.is_empty() {
            (self.duration_minutes as f64 / 60.0 * 100.0).round() / 100.0
        } else {
            notes.total_hours()
        };

        Ok(ClockOutSubmission {
            session_id: self.session_id,
            employee: self.employee,
            duration_minutes: self.duration_minutes,
            notes: notes.encode()?,
            total_hours,
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    generation: u64,
    loading: Option<(String, u64)>,
}

/// Released on drop, so the lock survives neither success nor failure.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Clears the loading marker of one load generation, even when the load
/// future is dropped mid-flight.
struct LoadingGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(&inner.loading, Some((_, g)) if *g == self.generation) {
            inner.loading = None;
        }
    }
}

pub struct TimeTracker {
    organization_id: String,
    gateway: Arc<dyn SessionGateway>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    policy: GracePolicy,
    inner: Mutex<Inner>,
    monitor: Mutex<GraceMonitor>,
    processing: AtomicBool,
}

impl TimeTracker {
    pub fn new(
        organization_id: impl Into<String>,
        gateway: Arc<dyn SessionGateway>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        policy: GracePolicy,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            gateway,
            clock,
            notifier,
            policy,
            inner: Mutex::new(Inner::default()),
            monitor: Mutex::new(GraceMonitor::default()),
            processing: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_monitor(&self) -> MutexGuard<'_, GraceMonitor> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn policy(&self) -> &GracePolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Recompute elapsed-work-seconds for the open session from timestamps.
    pub fn elapsed_now(&self) -> i64 {
        let now = self.clock.now();
        let mut inner = self.lock();
        let elapsed = inner
            .state
            .current
            .as_ref()
            .filter(|_| inner.state.is_tracking)
            .map(|s| elapsed_work_seconds(s, now))
            .unwrap_or(0);
        inner.state.elapsed_seconds = elapsed;
        elapsed
    }

    fn notify_failure(&self, what: &str, e: &AppError) {
        tracing::error!("{} failed: {}", what, e);
        self.notifier.error(&format!("{} failed: {}", what, e));
    }

    // ------------------------------------------------
    // Reconciliation
    // ------------------------------------------------

    /// Select `employee_id` and mirror its remote state.
    ///
    /// Never clocks anything in or out by itself, except the auto-termination
    /// of a session whose grace period is already over.
    pub async fn load_employee(&self, employee_id: &str) -> AppResult<LoadOutcome> {
        let key = EmployeeKey::new(&self.organization_id, employee_id);

        let generation = {
            let mut inner = self.lock();

            if let Some((loading, _)) = &inner.loading
                && loading == employee_id
            {
                tracing::debug!(employee = %key, "load already in flight");
                return Ok(LoadOutcome::AlreadyLoading);
            }

            inner.generation += 1;
            let generation = inner.generation;

            if inner.state.employee.as_ref() != Some(&key) {
                inner.state = SessionState::for_employee(key.clone());
            }
            inner.loading = Some((employee_id.to_string(), generation));
            generation
        };

        let guard = LoadingGuard {
            inner: &self.inner,
            generation,
        };
        let outcome = self.fetch_and_apply(&key, generation).await;
        drop(guard);
        let outcome = outcome?;

        if outcome == LoadOutcome::Loaded && self.snapshot().is_tracking {
            self.check_grace().await?;
        }

        Ok(outcome)
    }

    /// Re-read the selected employee without running the grace check.
    pub async fn refresh(&self) -> AppResult<LoadOutcome> {
        let (key, generation) = {
            let inner = self.lock();
            match &inner.state.employee {
                Some(k) => (k.clone(), inner.generation),
                None => return Ok(LoadOutcome::Stale),
            }
        };

        self.fetch_and_apply(&key, generation).await
    }

    async fn fetch_and_apply(
        &self,
        key: &EmployeeKey,
        generation: u64,
    ) -> AppResult<LoadOutcome> {
        let fetched = async {
            let active = self.gateway.check_active_time_log(key).await?;
            let history = self.gateway.fetch_time_logs(key).await?;
            Ok::<_, AppError>((active, history))
        }
        .await;

        let now = self.clock.now();
        let mut inner = self.lock();

        if inner.generation != generation || inner.state.employee.as_ref() != Some(key) {
            tracing::debug!(employee = %key, "discarding stale load result");
            return Ok(LoadOutcome::Stale);
        }

        let (active, history) = match fetched {
            Ok(v) => v,
            Err(e) => {
                drop(inner);
                self.notify_failure("Loading time logs", &e);
                return Err(e);
            }
        };

        inner.state.history = history;

        match active {
            Some(session) => {
                let elapsed = elapsed_work_seconds(&session, now);
                tracing::debug!(employee = %key, session_id = session.id, elapsed, "open session restored");
                inner.state.adopt(session, elapsed);
            }
            None => inner.state.clear_tracking(),
        }

        Ok(LoadOutcome::Loaded)
    }

    async fn reload_history(&self) -> AppResult<()> {
        let key = match self.lock().state.employee.clone() {
            Some(k) => k,
            None => return Ok(()),
        };

        let history = self.gateway.fetch_time_logs(&key).await.inspect_err(|e| {
            self.notify_failure("Loading time logs", e);
        })?;

        let mut inner = self.lock();
        if inner.state.employee.as_ref() == Some(&key) {
            inner.state.history = history;
        }
        Ok(())
    }

    // ------------------------------------------------
    // Grace period
    // ------------------------------------------------

    /// Evaluate the grace monitor once for the tracked session.
    pub async fn check_grace(&self) -> AppResult<GraceAction> {
        let now = self.clock.now();

        let (session_id, start, elapsed) = {
            let mut inner = self.lock();
            let Some(session) = inner.state.current.as_ref().filter(|_| inner.state.is_tracking)
            else {
                return Ok(GraceAction::None);
            };
            let (id, start) = (session.id, session.clock_in);
            let elapsed = elapsed_work_seconds(session, now);
            inner.state.elapsed_seconds = elapsed;
            (id, start, elapsed)
        };

        let action = self
            .lock_monitor()
            .evaluate(&self.policy, session_id, start, now);

        match &action {
            GraceAction::None => {}
            GraceAction::EnterGrace {
                expected_end,
                deadline,
            } => {
                {
                    let mut inner = self.lock();
                    if inner.state.current_session_id() == Some(session_id) {
                        inner.state.in_grace_period = true;
                    }
                }
                tracing::info!(session_id, "session entered grace period");
                self.notifier.warning(&format!(
                    "Expected end of day was {}. Please clock out: the session will be closed automatically at {}.",
                    format_time_display(*expected_end),
                    format_time_display(*deadline)
                ));
            }
            GraceAction::AutoTerminate => {
                if !self.auto_terminate(session_id, elapsed).await? {
                    return Ok(GraceAction::None);
                }
            }
        }

        Ok(action)
    }

    /// Force-close `session_id`. On success local tracking state is cleared
    /// and history reloaded.
    pub async fn auto_terminate(&self, session_id: i64, elapsed_seconds: i64) -> AppResult<bool> {
        let closed = match self
            .gateway
            .auto_terminate_time_log(session_id, elapsed_seconds)
            .await
        {
            Ok(closed) => closed,
            Err(e) => {
                self.lock_monitor().release(session_id);
                self.notify_failure("Automatic clock-out", &e);
                return Err(e);
            }
        };

        if !closed {
            tracing::warn!(session_id, "auto-termination found the session already closed");
            self.refresh().await?;
            return Ok(false);
        }

        {
            let mut inner = self.lock();
            if inner.state.current_session_id() == Some(session_id) {
                inner.state.clear_tracking();
            }
        }

        tracing::info!(session_id, elapsed_seconds, "session auto-terminated");
        self.notifier
            .warning("Grace period ended: your session was clocked out automatically.");

        self.reload_history().await?;
        Ok(true)
    }

    // ------------------------------------------------
    // Operations
    // ------------------------------------------------

    pub async fn clock_in(&self, input: ClockInInput) -> AppResult<OpOutcome<Session>> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            tracing::debug!("clock-in ignored: another operation is in progress");
            return Ok(OpOutcome::Skipped(SkipReason::Busy));
        };

        let key = {
            let inner = self.lock();
            match &inner.state.employee {
                None => return Ok(OpOutcome::Skipped(SkipReason::NoEmployee)),
                Some(_) if inner.state.is_tracking => {
                    tracing::debug!("clock-in ignored: already tracking");
                    return Ok(OpOutcome::Skipped(SkipReason::AlreadyTracking));
                }
                Some(k) => k.clone(),
            }
        };

        let notes = SessionNotes::new(input.notes, input.projects);
        let request = ClockInRequest {
            employee: key.clone(),
            notes: notes.encode()?,
            project_time: notes.projects.clone(),
            total_hours: notes.total_hours(),
        };

        let session = self.gateway.clock_in(&request).await.inspect_err(|e| {
            self.notify_failure("Clock-in", e);
        })?;

        let now = self.clock.now();
        let mut inner = self.lock();
        if inner.state.employee.as_ref() == Some(&key) {
            let elapsed = elapsed_work_seconds(&session, now);
            inner.state.adopt(session.clone(), elapsed);
        } else {
            tracing::debug!(employee = %key, "clock-in result not applied: employee changed");
        }

        tracing::info!(employee = %key, session_id = session.id, "clocked in");
        Ok(OpOutcome::Applied(session))
    }

    /// Prepare the clock-out. The session stays open until the request is
    /// confirmed through `submit_clock_out`.
    pub fn clock_out(&self) -> OpOutcome<ClockOutRequest> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let (Some(employee), Some(session)) = (
            inner.state.employee.clone(),
            inner.state.current.clone().filter(|_| inner.state.is_tracking),
        ) else {
            tracing::warn!("clock-out requested without an open session");
            return OpOutcome::Skipped(SkipReason::NoOpenSession);
        };

        let elapsed = elapsed_work_seconds(&session, now);
        inner.state.elapsed_seconds = elapsed;

        OpOutcome::Applied(ClockOutRequest {
            session_id: session.id,
            employee,
            clock_in: session.clock_in,
            elapsed_seconds: elapsed,
            duration_minutes: elapsed / 60,
            notes: inner.state.notes.clone(),
        })
    }

    /// Close the session in the store, then reset local tracking state.
    pub async fn submit_clock_out(
        &self,
        submission: ClockOutSubmission,
    ) -> AppResult<OpOutcome<Session>> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            return Ok(OpOutcome::Skipped(SkipReason::Busy));
        };

        let closed = self.gateway.clock_out(&submission).await.inspect_err(|e| {
            self.notify_failure("Clock-out", e);
        })?;

        {
            let mut inner = self.lock();
            if inner.state.current_session_id() == Some(submission.session_id) {
                inner.state.clear_tracking();
            }
        }

        tracing::info!(session_id = closed.id, minutes = submission.duration_minutes, "clocked out");
        self.reload_history().await?;
        Ok(OpOutcome::Applied(closed))
    }

    pub async fn start_break(&self, kind: BreakKind) -> AppResult<OpOutcome<Break>> {
        let session_id = {
            let inner = self.lock();
            match inner.state.tracking_session_id() {
                None => {
                    tracing::warn!("break requested without an open session");
                    return Ok(OpOutcome::Skipped(SkipReason::NoOpenSession));
                }
                Some(_) if inner.state.is_on_break => {
                    tracing::debug!("break already running");
                    return Ok(OpOutcome::Skipped(SkipReason::AlreadyOnBreak));
                }
                Some(id) => id,
            }
        };

        let started = self
            .gateway
            .start_break(session_id, kind)
            .await
            .inspect_err(|e| self.notify_failure("Starting break", e))?;

        {
            let mut inner = self.lock();
            if inner.state.current_session_id() == Some(session_id) {
                inner.state.is_on_break = true;
                inner.state.current_break = Some(started.clone());
                if let Some(session) = inner.state.current.as_mut() {
                    session.breaks.push(started.clone());
                }
            }
        }

        tracing::info!(session_id, break_id = started.id, kind = kind.to_db_str(), "break started");
        self.reload_history().await?;
        Ok(OpOutcome::Applied(started))
    }

    pub async fn end_break(&self) -> AppResult<OpOutcome<i64>> {
        let break_id = match self.lock().state.current_break.as_ref() {
            Some(b) => b.id,
            None => {
                tracing::warn!("end break requested without an open break");
                return Ok(OpOutcome::Skipped(SkipReason::NoOpenBreak));
            }
        };

        let ended = self
            .gateway
            .end_break(break_id)
            .await
            .inspect_err(|e| self.notify_failure("Ending break", e))?;

        if !ended {
            tracing::warn!(break_id, "store reported no open break");
            self.refresh().await?;
            return Ok(OpOutcome::Skipped(SkipReason::NoOpenBreak));
        }

        {
            let mut inner = self.lock();
            if inner.state.current_break.as_ref().map(|b| b.id) == Some(break_id) {
                inner.state.is_on_break = false;
                inner.state.current_break = None;
            }
        }

        tracing::info!(break_id, "break ended");
        // authoritative break duration comes back with the session
        self.refresh().await?;
        Ok(OpOutcome::Applied(break_id))
    }
}
