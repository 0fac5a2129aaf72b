//! Grace-period monitor.
//!
//! `GraceMonitor` is the one-shot state machine (Normal → Grace → Ended) for
//! a single session; `GracePoller` runs it on a fixed interval for as long as
//! that session is being tracked.
//!
//! Evaluation is polled (default once a minute), so the warning and the
//! auto-termination may lag the exact boundary by up to one interval.

use crate::core::calculator::expected::{GracePhase, GracePolicy};
use crate::core::poll::{PollOptions, PollOutcome, poll_until};
use crate::core::tracker::TimeTracker;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum GraceAction {
    None,
    /// First evaluation inside the grace window.
    EnterGrace {
        expected_end: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },
    /// First evaluation past the deadline.
    AutoTerminate,
}

#[derive(Debug, Default)]
pub struct GraceMonitor {
    session_id: Option<i64>,
    warned: bool,
    terminating: bool,
}

impl GraceMonitor {
    pub fn evaluate(
        &mut self,
        policy: &GracePolicy,
        session_id: i64,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> GraceAction {
        self.bind(session_id);

        match policy.phase(start, now) {
            GracePhase::Normal => GraceAction::None,
            GracePhase::Grace if self.warned => GraceAction::None,
            GracePhase::Grace => {
                self.warned = true;
                GraceAction::EnterGrace {
                    expected_end: policy.expected_clock_out_time(start),
                    deadline: policy.grace_deadline(start),
                }
            }
            GracePhase::Ended if self.terminating => GraceAction::None,
            GracePhase::Ended => {
                self.warned = true;
                self.terminating = true;
                GraceAction::AutoTerminate
            }
        }
    }

    /// Monitor state belongs to one session; a new id starts from scratch.
    fn bind(&mut self, session_id: i64) {
        if self.session_id != Some(session_id) {
            *self = Self {
                session_id: Some(session_id),
                ..Default::default()
            };
        }
    }

    /// Allow another termination attempt after a failed one.
    pub fn release(&mut self, session_id: i64) {
        if self.session_id == Some(session_id) {
            self.terminating = false;
        }
    }

    pub fn is_warned(&self) -> bool {
        self.warned
    }
}

struct PollerTask {
    session_id: i64,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns at most one grace poll, bound to the tracked session.
pub struct GracePoller {
    interval: Duration,
    running: Option<PollerTask>,
}

impl GracePoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    /// Align the poll with the tracker: keep it while the same session is
    /// tracked, tear it down when tracking stops, rebuild it fresh when the
    /// session changes.
    pub fn sync(&mut self, tracker: &Arc<TimeTracker>) {
        let target = tracker.snapshot().tracking_session_id();

        if let (Some(task), Some(id)) = (&self.running, target)
            && task.session_id == id
            && !task.handle.is_finished()
        {
            return;
        }

        self.stop();

        if let Some(session_id) = target {
            self.running = Some(spawn_poll(Arc::clone(tracker), session_id, self.interval));
        }
    }

    pub fn session_id(&self) -> Option<i64> {
        self.running
            .as_ref()
            .filter(|t| !t.handle.is_finished())
            .map(|t| t.session_id)
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.running.take() {
            let _ = task.cancel.send(true);
            task.handle.abort();
            tracing::debug!(session_id = task.session_id, "grace poll stopped");
        }
    }
}

impl Drop for GracePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_poll(tracker: Arc<TimeTracker>, session_id: i64, interval: Duration) -> PollerTask {
    let (cancel, cancel_rx) = watch::channel(false);

    tracing::debug!(session_id, ?interval, "grace poll started");

    let handle = tokio::spawn(async move {
        let probe = || {
            let tracker = Arc::clone(&tracker);
            async move {
                // failures were already notified; the next tick retries
                if let Err(e) = tracker.check_grace().await {
                    tracing::warn!(session_id, "grace check failed: {}", e);
                }
                Ok(tracker.snapshot().tracking_session_id())
            }
        };

        let outcome = poll_until(
            PollOptions::every(interval),
            cancel_rx,
            probe,
            |tracked| *tracked != Some(session_id),
        )
        .await;

        match outcome {
            Ok(PollOutcome::Terminal(_)) => {
                tracing::debug!(session_id, "session no longer tracked, grace poll ends")
            }
            Ok(PollOutcome::Cancelled) | Ok(PollOutcome::Exhausted(_)) => {}
            Err(e) => tracing::warn!(session_id, "grace poll aborted: {}", e),
        }
    });

    PollerTask {
        session_id,
        cancel,
        handle,
    }
}
