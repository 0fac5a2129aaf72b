//! Versioned schema migrations.
//!
//! Every applied step leaves a `migration_applied` row in `log` whose target
//! is the migration version, so each one runs exactly once per database.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20260301_0001_create_time_logs",
        description: "Created time_logs table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS time_logs (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id  TEXT NOT NULL,
            employee_id      TEXT NOT NULL,
            clock_in         TEXT NOT NULL,
            clock_out        TEXT,
            notes            TEXT NOT NULL DEFAULT '',
            total_hours      REAL,
            auto_terminated  INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_time_logs_employee
            ON time_logs(organization_id, employee_id, clock_in);
        "#,
    },
    Migration {
        version: "20260301_0002_create_breaks",
        description: "Created breaks table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS breaks (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            time_log_id       INTEGER NOT NULL REFERENCES time_logs(id) ON DELETE CASCADE,
            break_type        TEXT NOT NULL DEFAULT 'short'
                              CHECK(break_type IN ('lunch','short','personal','other')),
            start_time        TEXT NOT NULL,
            end_time          TEXT,
            duration_minutes  INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_breaks_time_log ON breaks(time_log_id, start_time);
        "#,
    },
    Migration {
        version: "20260315_0003_single_open_session_and_break",
        description: "Enforced one open session per employee and one open break per session",
        sql: r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_time_logs_one_open
            ON time_logs(organization_id, employee_id) WHERE clock_out IS NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS idx_breaks_one_open
            ON breaks(time_log_id) WHERE end_time IS NULL;
        "#,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![m.version, m.description],
    )?;

    tx.commit()?;
    tracing::info!(version = m.version, "migration applied");
    Ok(())
}

/// Versions not yet applied to this database, in order.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
///
/// Invocata da db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut applied = Vec::new();
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        applied.push(m.version);
    }

    Ok(applied)
}
