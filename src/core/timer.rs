//! Presentation counter: one tick per period while running.

use crate::utils::formatting::format_time;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug)]
pub struct Timer {
    seconds: Arc<AtomicI64>,
    period: Duration,
    tick: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new(initial_seconds: i64) -> Self {
        Self::with_period(initial_seconds, Duration::from_secs(1))
    }

    pub fn with_period(initial_seconds: i64, period: Duration) -> Self {
        Self {
            seconds: Arc::new(AtomicI64::new(initial_seconds.max(0))),
            period,
            tick: None,
        }
    }

    /// Start or stop ticking. Starting an already running timer is a no-op,
    /// so there is never more than one tick source.
    pub fn set_running(&mut self, running: bool) {
        match (running, self.tick.is_some()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let seconds = Arc::clone(&self.seconds);
        let period = self.period;

        self.tick = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                seconds.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.abort();
        }
    }

    /// Replace the counter (e.g. after reconciliation) without touching the
    /// tick source.
    pub fn reset(&self, seconds: i64) {
        self.seconds.store(seconds.max(0), Ordering::SeqCst);
    }

    pub fn seconds(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }

    pub fn display(&self) -> String {
        format_time(self.seconds())
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}
