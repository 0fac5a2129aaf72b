//! Per-project time breakdown carried inside session notes.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTime {
    pub project: String,
    pub hours: f64,
}

impl ProjectTime {
    /// Parse a CLI entry of the form `name=hours` (e.g. `backend=2.5`).
    pub fn parse(entry: &str) -> AppResult<Self> {
        let (name, hours) = entry
            .split_once('=')
            .ok_or_else(|| AppError::InvalidProject(entry.to_string()))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidProject(entry.to_string()));
        }

        let hours: f64 = hours
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidProject(entry.to_string()))?;

        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::InvalidProject(entry.to_string()));
        }

        Ok(Self {
            project: name.to_string(),
            hours,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct NotesDocument {
    #[serde(default)]
    notes: String,
    projects: Vec<ProjectTime>,
}

/// Decoded form of `time_logs.notes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionNotes {
    pub text: String,
    pub projects: Vec<ProjectTime>,
}

impl SessionNotes {
    pub fn new(text: impl Into<String>, projects: Vec<ProjectTime>) -> Self {
        Self {
            text: text.into(),
            projects,
        }
    }

    /// Plain text when there is no breakdown, a JSON document otherwise.
    pub fn encode(&self) -> AppResult<String> {
        if self.projects.is_empty() {
            return Ok(self.text.clone());
        }

        let doc = NotesDocument {
            notes: self.text.clone(),
            projects: self.projects.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Anything that is not a breakdown document is kept as plain text.
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('{')
            && let Ok(doc) = serde_json::from_str::<NotesDocument>(raw)
        {
            return Self {
                text: doc.notes,
                projects: doc.projects,
            };
        }

        Self {
            text: raw.to_string(),
            projects: Vec::new(),
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.projects.iter().map(|p| p.hours).sum()
    }
}
