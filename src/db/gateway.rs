//! SQLite-backed `SessionGateway`.
//!
//! Each write runs in one transaction together with its audit row in `log`.
//! Store time comes from the injected clock so the same instant is seen by
//! the tracker and the database in tests.

use crate::core::clock::Clock;
use crate::core::gateway::{ClockInRequest, ClockOutSubmission, SessionGateway};
use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::break_kind::BreakKind;
use crate::models::employee::EmployeeKey;
use crate::models::session::{Break, Session};
use crate::utils::time::{round_to_minutes, seconds_between};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SqliteGateway {
    pool: Mutex<DbPool>,
    clock: Arc<dyn Clock>,
}

impl SqliteGateway {
    /// Wrap an open pool, bringing its schema up to date first.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let applied = init_db(&pool.conn)?;
        if !applied.is_empty() {
            tracing::debug!(count = applied.len(), "schema migrated");
        }
        Ok(Self {
            pool: Mutex::new(pool),
            clock,
        })
    }

    pub fn open(path: &str, clock: Arc<dyn Clock>) -> AppResult<Self> {
        Self::new(DbPool::new(path)?, clock)
    }

    /// Store time, cut to the second precision timestamps are kept at.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }

    async fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send,
        T: Send,
    {
        let mut pool = self.pool.lock().await;
        f(&mut pool.conn)
    }
}

#[async_trait]
impl SessionGateway for SqliteGateway {
    async fn check_active_time_log(&self, employee: &EmployeeKey) -> AppResult<Option<Session>> {
        self.with_conn(|conn| queries::find_open_session(conn, employee))
            .await
    }

    async fn fetch_time_logs(&self, employee: &EmployeeKey) -> AppResult<Vec<Session>> {
        self.with_conn(|conn| queries::list_sessions(conn, employee, None))
            .await
    }

    async fn clock_in(&self, request: &ClockInRequest) -> AppResult<Session> {
        let now = self.now();
        let key = &request.employee;
        let total_hours = (!request.project_time.is_empty()).then_some(request.total_hours);

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            if queries::find_open_session(&tx, key)?.is_some() {
                return Err(AppError::SessionAlreadyOpen(key.to_string()));
            }

            let session = match queries::insert_session(&tx, key, now, &request.notes, total_hours)
            {
                Err(AppError::Db(e)) if queries::is_unique_violation(&e) => {
                    return Err(AppError::SessionAlreadyOpen(key.to_string()));
                }
                other => other?,
            };

            ttlog(
                &tx,
                "clock_in",
                &key.to_string(),
                &format!("Session {} opened", session.id),
            )?;
            tx.commit()?;
            Ok(session)
        })
        .await
    }

    async fn clock_out(&self, submission: &ClockOutSubmission) -> AppResult<Session> {
        let now = self.now();
        let id = submission.session_id;

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let session = queries::find_session(&tx, id)?.ok_or(AppError::SessionNotFound(id))?;
            if session.key() != submission.employee {
                return Err(AppError::SessionNotFound(id));
            }
            if !session.is_open() {
                return Err(AppError::SessionClosed(id));
            }

            let breaks_closed = queries::close_open_breaks(&tx, id, now)?;
            if !queries::close_session(
                &tx,
                id,
                now,
                Some(&submission.notes),
                submission.total_hours,
                false,
            )? {
                return Err(AppError::SessionClosed(id));
            }

            let mut message = format!(
                "Session {} closed after {} min",
                id, submission.duration_minutes
            );
            if breaks_closed > 0 {
                message.push_str(&format!(" ({} open break closed)", breaks_closed));
            }
            ttlog(&tx, "clock_out", &submission.employee.to_string(), &message)?;

            let closed = queries::find_session(&tx, id)?.ok_or(AppError::SessionNotFound(id))?;
            tx.commit()?;
            Ok(closed)
        })
        .await
    }

    async fn start_break(&self, session_id: i64, kind: BreakKind) -> AppResult<Break> {
        let now = self.now();

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let session = queries::find_session(&tx, session_id)?
                .ok_or(AppError::SessionNotFound(session_id))?;
            if !session.is_open() {
                return Err(AppError::SessionClosed(session_id));
            }
            if queries::find_open_break(&tx, session_id)?.is_some() {
                return Err(AppError::BreakAlreadyOpen(session_id));
            }

            let started = match queries::insert_break(&tx, session_id, kind, now) {
                Err(AppError::Db(e)) if queries::is_unique_violation(&e) => {
                    return Err(AppError::BreakAlreadyOpen(session_id));
                }
                other => other?,
            };

            ttlog(
                &tx,
                "break_start",
                &session.key().to_string(),
                &format!("{} break {} started in session {}", kind.label(), started.id, session_id),
            )?;
            tx.commit()?;
            Ok(started)
        })
        .await
    }

    async fn end_break(&self, break_id: i64) -> AppResult<bool> {
        let now = self.now();

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let Some(open) = queries::find_break(&tx, break_id)?.filter(Break::is_open) else {
                return Ok(false);
            };

            let minutes = round_to_minutes(seconds_between(open.start, now));
            if !queries::close_break(&tx, break_id, now, minutes)? {
                return Ok(false);
            }

            let target = queries::find_session(&tx, open.session_id)?
                .map(|s| s.key().to_string())
                .unwrap_or_default();
            ttlog(
                &tx,
                "break_end",
                &target,
                &format!("Break {} ended after {} min", break_id, minutes),
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    async fn auto_terminate_time_log(
        &self,
        session_id: i64,
        elapsed_seconds: i64,
    ) -> AppResult<bool> {
        let now = self.now();
        let total_hours = (elapsed_seconds.max(0) as f64 / 3600.0 * 100.0).round() / 100.0;

        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let Some(session) = queries::find_session(&tx, session_id)?.filter(Session::is_open)
            else {
                return Ok(false);
            };

            queries::close_open_breaks(&tx, session_id, now)?;
            if !queries::close_session(&tx, session_id, now, None, total_hours, true)? {
                return Ok(false);
            }

            ttlog(
                &tx,
                "auto_terminate",
                &session.key().to_string(),
                &format!(
                    "Session {} closed automatically after grace period ({:.2} h worked)",
                    session_id, total_hours
                ),
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }
}
