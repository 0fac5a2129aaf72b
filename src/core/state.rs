//! Local mirror of the employee's tracking state.

use crate::models::employee::EmployeeKey;
use crate::models::project_time::SessionNotes;
use crate::models::session::{Break, Session};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub employee: Option<EmployeeKey>,
    pub current: Option<Session>,
    pub current_break: Option<Break>,
    pub notes: SessionNotes,
    pub is_tracking: bool,
    pub is_on_break: bool,
    /// Sticky once the grace warning fired for the current session.
    pub in_grace_period: bool,
    /// Last reconciled elapsed-work-seconds.
    pub elapsed_seconds: i64,
    pub history: Vec<Session>,
}

impl SessionState {
    /// Fresh state for a newly selected employee.
    pub fn for_employee(employee: EmployeeKey) -> Self {
        Self {
            employee: Some(employee),
            ..Default::default()
        }
    }

    pub fn current_session_id(&self) -> Option<i64> {
        self.current.as_ref().map(|s| s.id)
    }

    /// Session id while tracking is on.
    pub fn tracking_session_id(&self) -> Option<i64> {
        if self.is_tracking {
            self.current_session_id()
        } else {
            None
        }
    }

    /// Mirror an open session coming from the store.
    pub fn adopt(&mut self, session: Session, elapsed_seconds: i64) {
        if self.current_session_id() != Some(session.id) {
            self.in_grace_period = false;
        }

        self.current_break = session.open_break().cloned();
        self.is_on_break = self.current_break.is_some();
        self.notes = SessionNotes::decode(&session.notes);
        self.elapsed_seconds = elapsed_seconds;
        self.is_tracking = true;
        self.current = Some(session);
    }

    /// No open session: everything but the employee and history goes.
    pub fn clear_tracking(&mut self) {
        self.current = None;
        self.current_break = None;
        self.notes = SessionNotes::default();
        self.is_tracking = false;
        self.is_on_break = false;
        self.in_grace_period = false;
        self.elapsed_seconds = 0;
    }
}
