use super::{break_kind::BreakKind, employee::EmployeeKey};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One break inside a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Break {
    pub id: i64,
    pub session_id: i64,          // ⇔ breaks.time_log_id
    pub kind: BreakKind,          // ⇔ breaks.break_type
    pub start: DateTime<Utc>,     // ⇔ breaks.start_time (RFC3339)
    pub end: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>, // set by the store on close
}

impl Break {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// A time log: one continuous clock-in → clock-out record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: i64,
    pub organization_id: String,
    pub employee_id: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub notes: String,
    pub total_hours: Option<f64>,
    pub auto_terminated: bool,
    pub breaks: Vec<Break>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn key(&self) -> EmployeeKey {
        EmployeeKey::new(&self.organization_id, &self.employee_id)
    }

    /// The break still running, if any. The store guarantees at most one.
    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.is_open())
    }
}
