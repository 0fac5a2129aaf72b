//! Unified application error type.
//! All modules (db, core, jobs, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Serialization
    // ---------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Remote job API
    // ---------------------------
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job API returned {status} for {url}")]
    JobApi { status: u16, url: String },

    #[error("Job {0} did not reach a terminal state in time")]
    JobTimeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid break type: {0}")]
    InvalidBreakKind(String),

    #[error("Invalid project entry: {0}")]
    InvalidProject(String),

    // ---------------------------
    // Session store
    // ---------------------------
    #[error("Employee {0} already has an open session")]
    SessionAlreadyOpen(String),

    #[error("Session {0} already has an open break")]
    BreakAlreadyOpen(i64),

    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("Session {0} is already closed")]
    SessionClosed(i64),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
