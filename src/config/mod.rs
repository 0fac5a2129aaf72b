use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_organization")]
    pub organization_id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default = "default_expected_work")]
    pub expected_work_duration: String,
    #[serde(default = "default_grace_allowance")]
    pub grace_allowance_minutes: i64,
    #[serde(default = "default_grace_poll")]
    pub grace_poll_seconds: u64,
    #[serde(default = "default_break_kind")]
    pub default_break_kind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_job_api_url")]
    pub job_api_url: String,
    #[serde(default = "default_job_poll")]
    pub job_poll_seconds: u64,
    #[serde(default = "default_job_attempts")]
    pub job_max_attempts: u32,
}

fn default_organization() -> String {
    "default".to_string()
}
fn default_expected_work() -> String {
    "8h".to_string()
}
fn default_grace_allowance() -> i64 {
    30
}
fn default_grace_poll() -> u64 {
    60
}
fn default_break_kind() -> String {
    "short".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_job_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_job_poll() -> u64 {
    5
}
fn default_job_attempts() -> u32 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file().to_string_lossy().to_string())
    }
}

impl Config {
    fn with_database(database: String) -> Self {
        Self {
            database,
            organization_id: default_organization(),
            employee_id: String::new(),
            expected_work_duration: default_expected_work(),
            grace_allowance_minutes: default_grace_allowance(),
            grace_poll_seconds: default_grace_poll(),
            default_break_kind: default_break_kind(),
            log_level: default_log_level(),
            job_api_url: default_job_api_url(),
            job_poll_seconds: default_job_poll(),
            job_max_attempts: default_job_attempts(),
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rtimeclock")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rtimeclock")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let mut cfg: Config = serde_yaml::from_str(content)?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        if !is_test {
            fs::create_dir_all(&dir)?;
        }

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = expand_tilde(&name);
            if p.is_absolute() { p } else { dir.join(p) }
        } else {
            dir.join("rtimeclock.sqlite")
        };

        let config = Config::with_database(db_path.to_string_lossy().to_string());

        // Write config file
        if !is_test {
            let yaml = config.to_yaml()?;
            let mut file = fs::File::create(Self::config_file()).map_err(|_| AppError::ConfigSave)?;
            file.write_all(yaml.as_bytes())
                .map_err(|_| AppError::ConfigSave)?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        // Create empty DB file if not exists
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(config)
    }

    /// Resolve which employee the CLI acts on: explicit flag first, then config.
    pub fn resolve_employee(&self, flag: Option<&String>) -> AppResult<String> {
        let id = flag.cloned().unwrap_or_else(|| self.employee_id.clone());
        if id.trim().is_empty() {
            return Err(AppError::Config(
                "No employee selected: pass --employee or set employee_id in the config".into(),
            ));
        }
        Ok(id)
    }
}

/// Editor for `config --edit`: $EDITOR, then $VISUAL, then a platform default.
pub fn platform_editor() -> String {
    env::var("EDITOR")
        .or_else(|_| env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        })
}

