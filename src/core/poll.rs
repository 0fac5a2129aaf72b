//! Cancelable poll-until-terminal-state loop.
//!
//! Shared by the grace-period poller and the resume validation job wait:
//! probe, check the result, sleep, repeat.

use crate::errors::AppResult;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` polls until a terminal value or cancellation.
    pub max_attempts: Option<u32>,
}

impl PollOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The probe returned a value accepted by the terminal predicate.
    Terminal(T),
    /// `max_attempts` probes ran without a terminal value; carries the last one.
    Exhausted(T),
    /// The cancel signal flipped to `true` or its sender was dropped.
    Cancelled,
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Probe immediately, then once per `options.interval`. At least one probe
/// always runs, even with `max_attempts == Some(0)`.
///
/// Probe errors end the loop and are returned as-is; there is no retry here.
pub async fn poll_until<T, F, Fut, P>(
    options: PollOptions,
    mut cancel: watch::Receiver<bool>,
    mut probe: F,
    is_terminal: P,
) -> AppResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
    P: Fn(&T) -> bool,
{
    let mut attempts: u32 = 0;

    loop {
        if is_cancelled(&cancel) {
            return Ok(PollOutcome::Cancelled);
        }

        let value = probe().await?;
        attempts += 1;

        if is_terminal(&value) {
            return Ok(PollOutcome::Terminal(value));
        }

        tracing::trace!(attempts, "poll attempt not terminal");

        if let Some(max) = options.max_attempts
            && attempts >= max
        {
            return Ok(PollOutcome::Exhausted(value));
        }

        let sleep = time::sleep(options.interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || is_cancelled(&cancel) {
                        return Ok(PollOutcome::Cancelled);
                    }
                }
                _ = &mut sleep => break,
            }
        }
    }
}
