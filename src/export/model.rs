// src/export/model.rs

use crate::core::calculator::elapsed::{elapsed_work_seconds, total_break_seconds};
use crate::models::project_time::SessionNotes;
use crate::models::session::Session;
use crate::utils::time::format_date_time;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Flat, one-row-per-session view for CSV / JSON.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SessionExport {
    pub id: i64,
    pub organization_id: String,
    pub employee_id: String,
    pub clock_in: String,
    pub clock_out: String,
    pub break_count: usize,
    pub break_minutes: i64,
    pub worked_minutes: i64,
    pub total_hours: Option<f64>,
    pub auto_terminated: bool,
    pub notes: String,
    /// `name=hours` pairs joined by `;`, empty without a breakdown.
    pub projects: String,
}

impl SessionExport {
    /// `now` only matters for a session that is still open.
    pub fn from_session(s: &Session, now: DateTime<Utc>) -> Self {
        let notes = SessionNotes::decode(&s.notes);
        let end = s.clock_out.unwrap_or(now);

        Self {
            id: s.id,
            organization_id: s.organization_id.clone(),
            employee_id: s.employee_id.clone(),
            clock_in: format_date_time(s.clock_in),
            clock_out: s.clock_out.map(format_date_time).unwrap_or_default(),
            break_count: s.breaks.len(),
            break_minutes: total_break_seconds(s, end) / 60,
            worked_minutes: elapsed_work_seconds(s, now) / 60,
            total_hours: s.total_hours,
            auto_terminated: s.auto_terminated,
            notes: notes.text,
            projects: notes
                .projects
                .iter()
                .map(|p| format!("{}={}", p.project, p.hours))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}
