#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rtimeclock::core::calculator::expected::GracePolicy;
use rtimeclock::core::clock::{Clock, ManualClock};
use rtimeclock::core::gateway::{ClockInRequest, ClockOutSubmission, SessionGateway};
use rtimeclock::core::tracker::TimeTracker;
use rtimeclock::db::gateway::SqliteGateway;
use rtimeclock::db::pool::DbPool;
use rtimeclock::errors::{AppError, AppResult};
use rtimeclock::models::break_kind::BreakKind;
use rtimeclock::models::employee::EmployeeKey;
use rtimeclock::models::session::{Break, Session};
use rtimeclock::ui::messages::NoticeLevel;
use rtimeclock::ui::notifier::Notifier;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const ORG: &str = "acme";

pub fn rti() -> Command {
    cargo_bin_cmd!("rtimeclock")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtimeclock.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Initialize a test DB through the CLI.
pub fn init_test_db(db_path: &str) {
    rti()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// 2026-03-02 at `h:m` UTC.
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

pub fn key(employee: &str) -> EmployeeKey {
    EmployeeKey::new(ORG, employee)
}

// ------------------------------------------------
// Notifier
// ------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn with_level(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.with_level(NoticeLevel::Warning)
    }

    pub fn errors(&self) -> Vec<String> {
        self.with_level(NoticeLevel::Error)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

// ------------------------------------------------
// Gateway wrapper: hold calls for one employee, inject failures
// ------------------------------------------------

pub struct GatedGateway {
    inner: SqliteGateway,
    gated: Mutex<Option<String>>,
    open: watch::Sender<bool>,
    pub waiting: AtomicUsize,
    pub clock_in_calls: AtomicUsize,
    pub auto_terminate_calls: AtomicUsize,
    fail_auto_terminate: AtomicUsize,
}

impl GatedGateway {
    pub fn new(inner: SqliteGateway) -> Self {
        let (open, _) = watch::channel(true);
        Self {
            inner,
            gated: Mutex::new(None),
            open,
            waiting: AtomicUsize::new(0),
            clock_in_calls: AtomicUsize::new(0),
            auto_terminate_calls: AtomicUsize::new(0),
            fail_auto_terminate: AtomicUsize::new(0),
        }
    }

    /// Calls for `employee_id` block until `release()`.
    pub fn hold(&self, employee_id: &str) {
        *self.gated.lock().unwrap() = Some(employee_id.to_string());
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        *self.gated.lock().unwrap() = None;
        self.open.send_replace(true);
    }

    /// The next `n` auto-terminations fail with a store error.
    pub fn fail_next_auto_terminations(&self, n: usize) {
        self.fail_auto_terminate.store(n, Ordering::SeqCst);
    }

    /// Yield until `n` calls are parked at the gate.
    pub async fn wait_for_parked(&self, n: usize) {
        while self.waiting.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    async fn pass(&self, employee: &EmployeeKey) {
        let gated = self.gated.lock().unwrap().clone();
        if gated.as_deref() == Some(employee.employee_id.as_str()) {
            let mut rx = self.open.subscribe();
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let _ = rx.wait_for(|open| *open).await;
        }
    }
}

#[async_trait]
impl SessionGateway for GatedGateway {
    async fn check_active_time_log(&self, employee: &EmployeeKey) -> AppResult<Option<Session>> {
        self.pass(employee).await;
        self.inner.check_active_time_log(employee).await
    }

    async fn fetch_time_logs(&self, employee: &EmployeeKey) -> AppResult<Vec<Session>> {
        self.inner.fetch_time_logs(employee).await
    }

    async fn clock_in(&self, request: &ClockInRequest) -> AppResult<Session> {
        self.clock_in_calls.fetch_add(1, Ordering::SeqCst);
        self.pass(&request.employee).await;
        self.inner.clock_in(request).await
    }

    async fn clock_out(&self, submission: &ClockOutSubmission) -> AppResult<Session> {
        self.inner.clock_out(submission).await
    }

    async fn start_break(&self, session_id: i64, kind: BreakKind) -> AppResult<Break> {
        self.inner.start_break(session_id, kind).await
    }

    async fn end_break(&self, break_id: i64) -> AppResult<bool> {
        self.inner.end_break(break_id).await
    }

    async fn auto_terminate_time_log(
        &self,
        session_id: i64,
        elapsed_seconds: i64,
    ) -> AppResult<bool> {
        self.auto_terminate_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .fail_auto_terminate
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Other("store unavailable".into()));
        }
        self.inner
            .auto_terminate_time_log(session_id, elapsed_seconds)
            .await
    }
}

// ------------------------------------------------
// Tracker fixture
// ------------------------------------------------

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<GatedGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub tracker: Arc<TimeTracker>,
}

impl Fixture {
    /// A second tracker over the same store, as after a restart.
    pub fn restarted(&self) -> Arc<TimeTracker> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let gateway: Arc<dyn SessionGateway> = self.gateway.clone();
        Arc::new(TimeTracker::new(
            ORG,
            gateway,
            clock,
            self.notifier.clone(),
            GracePolicy::default(),
        ))
    }
}

/// Tracker over an in-memory store, 8h + 30min policy, clock at `start`.
pub fn fixture(start: DateTime<Utc>) -> Fixture {
    let clock = Arc::new(ManualClock::new(start));
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let store = SqliteGateway::new(DbPool::in_memory().unwrap(), dyn_clock.clone()).unwrap();
    let gateway = Arc::new(GatedGateway::new(store));
    let notifier = Arc::new(RecordingNotifier::default());

    let dyn_gateway: Arc<dyn SessionGateway> = gateway.clone();
    let tracker = Arc::new(TimeTracker::new(
        ORG,
        dyn_gateway,
        dyn_clock,
        notifier.clone(),
        GracePolicy::default(),
    ));

    Fixture {
        clock,
        gateway,
        notifier,
        tracker,
    }
}
