//! Configuration file upgrades: detect keys added in newer releases and fill
//! them in with their defaults, keeping every value the user already set.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn default_mapping() -> AppResult<Mapping> {
    let value = serde_yaml::to_value(Config::default())?;
    match value {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default configuration is not a mapping".into())),
    }
}

fn parse_mapping(content: &str) -> AppResult<Mapping> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config("configuration file is not a YAML mapping".into())),
    }
}

/// Keys present in the current schema but missing from `content`.
pub fn missing_keys(content: &str) -> AppResult<Vec<String>> {
    let current = parse_mapping(content)?;
    let defaults = default_mapping()?;

    Ok(defaults
        .keys()
        .filter(|k| !current.contains_key(*k))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect())
}

/// Add missing keys to `content`, returning the new YAML and the keys added.
pub fn fill_missing_keys(content: &str) -> AppResult<(String, Vec<String>)> {
    let mut current = parse_mapping(content)?;
    let defaults = default_mapping()?;
    let mut added = Vec::new();

    for (k, v) in defaults {
        if !current.contains_key(&k) {
            if let Some(name) = k.as_str() {
                added.push(name.to_string());
            }
            current.insert(k, v);
        }
    }

    Ok((serde_yaml::to_string(&Value::Mapping(current))?, added))
}

/// Check the config file on disk and report what is missing.
pub fn check_file(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let missing = missing_keys(&content)?;

    if missing.is_empty() {
        success("Configuration is up to date.");
    } else {
        info(format!("Missing configuration keys: {}", missing.join(", ")));
    }

    Ok(missing)
}

/// Rewrite the config file on disk with every missing key filled in.
pub fn migrate_file(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let (updated, added) = fill_missing_keys(&content)?;

    if added.is_empty() {
        info("No configuration migration needed.");
        return Ok(added);
    }

    fs::write(path, updated).map_err(|_| AppError::ConfigSave)?;
    success(format!("Configuration migrated: added {}", added.join(", ")));
    Ok(added)
}
