// src/export/logic.rs

use crate::db::pool::DbPool;
use crate::db::queries::list_sessions;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::SessionExport;
use crate::models::employee::EmployeeKey;
use crate::ui::messages::warning;
use chrono::{DateTime, Utc};
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Export every session of `employee`, oldest first.
    ///
    /// `file` must be an absolute path.
    pub fn export(
        pool: &DbPool,
        employee: &EmployeeKey,
        format: ExportFormat,
        file: &str,
        force: bool,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        ensure_writable(path, force)?;

        let rows = load_sessions(pool, employee, now)?;

        if rows.is_empty() {
            warning(format!("No sessions found for {}.", employee));
            return Ok(0);
        }

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
        }

        tracing::info!(employee = %employee, format = format.as_str(), rows = rows.len(), "sessions exported");
        Ok(rows.len())
    }
}

fn load_sessions(
    pool: &DbPool,
    employee: &EmployeeKey,
    now: DateTime<Utc>,
) -> AppResult<Vec<SessionExport>> {
    let mut sessions = list_sessions(&pool.conn, employee, None)?;
    sessions.reverse();

    Ok(sessions
        .iter()
        .map(|s| SessionExport::from_session(s, now))
        .collect())
}
