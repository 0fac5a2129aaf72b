//! Plain SQL over `time_logs` and `breaks`.
//!
//! All functions are synchronous and take a borrowed connection; the async
//! boundary lives in `db::gateway`.

use crate::errors::{AppError, AppResult};
use crate::models::break_kind::BreakKind;
use crate::models::employee::EmployeeKey;
use crate::models::session::{Break, Session};
use crate::utils::time::{round_to_minutes, seconds_between};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const SESSION_COLUMNS: &str = "id, organization_id, employee_id, clock_in, clock_out, notes, \
                               total_hours, auto_terminated";

const BREAK_COLUMNS: &str = "id, time_log_id, break_type, start_time, end_time, duration_minutes";

/// Timestamps are stored as RFC3339 UTC, second precision.
pub fn fmt_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_ts(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidTime(raw.to_string()))
}

fn conversion_error(idx: usize, e: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw).map_err(|e| conversion_error(idx, e))
}

fn opt_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn map_session_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        employee_id: row.get(2)?,
        clock_in: ts_column(row, 3)?,
        clock_out: opt_ts_column(row, 4)?,
        notes: row.get(5)?,
        total_hours: row.get(6)?,
        auto_terminated: row.get::<_, i64>(7)? != 0,
        breaks: Vec::new(),
    })
}

fn map_break_row(row: &Row) -> rusqlite::Result<Break> {
    let kind_raw: String = row.get(2)?;
    let kind = BreakKind::from_db_str(&kind_raw)
        .ok_or_else(|| conversion_error(2, AppError::InvalidBreakKind(kind_raw.clone())))?;

    Ok(Break {
        id: row.get(0)?,
        session_id: row.get(1)?,
        kind,
        start: ts_column(row, 3)?,
        end: opt_ts_column(row, 4)?,
        duration_minutes: row.get(5)?,
    })
}

/// True when `e` is a UNIQUE constraint failure (one of the open indexes).
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ------------------------------------------------
// Breaks
// ------------------------------------------------

pub fn load_breaks(conn: &Connection, session_id: i64) -> AppResult<Vec<Break>> {
    let sql = format!(
        "SELECT {BREAK_COLUMNS} FROM breaks WHERE time_log_id = ?1 ORDER BY start_time ASC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([session_id], map_break_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn find_break(conn: &Connection, break_id: i64) -> AppResult<Option<Break>> {
    let sql = format!("SELECT {BREAK_COLUMNS} FROM breaks WHERE id = ?1");
    Ok(conn.query_row(&sql, [break_id], map_break_row).optional()?)
}

pub fn find_open_break(conn: &Connection, session_id: i64) -> AppResult<Option<Break>> {
    let sql =
        format!("SELECT {BREAK_COLUMNS} FROM breaks WHERE time_log_id = ?1 AND end_time IS NULL");
    Ok(conn.query_row(&sql, [session_id], map_break_row).optional()?)
}

pub fn insert_break(
    conn: &Connection,
    session_id: i64,
    kind: BreakKind,
    start: DateTime<Utc>,
) -> AppResult<Break> {
    conn.execute(
        "INSERT INTO breaks (time_log_id, break_type, start_time) VALUES (?1, ?2, ?3)",
        params![session_id, kind.to_db_str(), fmt_ts(start)],
    )?;

    Ok(Break {
        id: conn.last_insert_rowid(),
        session_id,
        kind,
        start,
        end: None,
        duration_minutes: None,
    })
}

/// Close an open break. Returns `false` when it was already closed.
pub fn close_break(
    conn: &Connection,
    break_id: i64,
    end: DateTime<Utc>,
    duration_minutes: i64,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE breaks SET end_time = ?1, duration_minutes = ?2
         WHERE id = ?3 AND end_time IS NULL",
        params![fmt_ts(end), duration_minutes, break_id],
    )?;
    Ok(changed > 0)
}

/// Close every open break of a session at `end`; returns how many closed.
pub fn close_open_breaks(conn: &Connection, session_id: i64, end: DateTime<Utc>) -> AppResult<usize> {
    let open: Vec<Break> = load_breaks(conn, session_id)?
        .into_iter()
        .filter(Break::is_open)
        .collect();

    let mut closed = 0;
    for b in open {
        let minutes = round_to_minutes(seconds_between(b.start, end));
        if close_break(conn, b.id, end, minutes)? {
            closed += 1;
        }
    }
    Ok(closed)
}

// ------------------------------------------------
// Sessions
// ------------------------------------------------

fn with_breaks(conn: &Connection, mut session: Session) -> AppResult<Session> {
    session.breaks = load_breaks(conn, session.id)?;
    Ok(session)
}

pub fn find_session(conn: &Connection, session_id: i64) -> AppResult<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM time_logs WHERE id = ?1");
    match conn.query_row(&sql, [session_id], map_session_row).optional()? {
        Some(s) => Ok(Some(with_breaks(conn, s)?)),
        None => Ok(None),
    }
}

pub fn find_open_session(conn: &Connection, key: &EmployeeKey) -> AppResult<Option<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM time_logs
         WHERE organization_id = ?1 AND employee_id = ?2 AND clock_out IS NULL
         ORDER BY clock_in DESC LIMIT 1"
    );
    let found = conn
        .query_row(
            &sql,
            params![key.organization_id, key.employee_id],
            map_session_row,
        )
        .optional()?;

    match found {
        Some(s) => Ok(Some(with_breaks(conn, s)?)),
        None => Ok(None),
    }
}

/// Sessions of `key`, newest first. `limit = None` returns all of them.
pub fn list_sessions(
    conn: &Connection,
    key: &EmployeeKey,
    limit: Option<usize>,
) -> AppResult<Vec<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM time_logs
         WHERE organization_id = ?1 AND employee_id = ?2
         ORDER BY clock_in DESC, id DESC
         LIMIT ?3"
    );
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(
        params![key.organization_id, key.employee_id, limit],
        map_session_row,
    )?;

    let mut sessions = Vec::new();
    for r in rows {
        sessions.push(r?);
    }

    sessions
        .into_iter()
        .map(|s| with_breaks(conn, s))
        .collect()
}

pub fn insert_session(
    conn: &Connection,
    key: &EmployeeKey,
    clock_in: DateTime<Utc>,
    notes: &str,
    total_hours: Option<f64>,
) -> AppResult<Session> {
    let ts = fmt_ts(clock_in);
    conn.execute(
        "INSERT INTO time_logs (organization_id, employee_id, clock_in, notes, total_hours, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![key.organization_id, key.employee_id, ts, notes, total_hours, ts],
    )?;

    Ok(Session {
        id: conn.last_insert_rowid(),
        organization_id: key.organization_id.clone(),
        employee_id: key.employee_id.clone(),
        clock_in,
        clock_out: None,
        notes: notes.to_string(),
        total_hours,
        auto_terminated: false,
        breaks: Vec::new(),
    })
}

/// Close an open session. Returns `false` when it was already closed.
pub fn close_session(
    conn: &Connection,
    session_id: i64,
    clock_out: DateTime<Utc>,
    notes: Option<&str>,
    total_hours: f64,
    auto_terminated: bool,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE time_logs
         SET clock_out = ?1,
             notes = COALESCE(?2, notes),
             total_hours = ?3,
             auto_terminated = ?4
         WHERE id = ?5 AND clock_out IS NULL",
        params![
            fmt_ts(clock_out),
            notes,
            total_hours,
            auto_terminated as i64,
            session_id
        ],
    )?;
    Ok(changed > 0)
}

pub fn count_rows(conn: &Connection, table: &str) -> AppResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}
