use crate::cli::parser::Commands;
use crate::config::migrate::{check_file, migrate_file};
use crate::config::{Config, platform_editor};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{error, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate,
        edit_config,
        editor,
    } = cmd
    {
        let path = Config::config_file();

        if *print_config {
            println!("📄 Current configuration:\n");
            println!("{}", cfg.to_yaml()?);
        }

        if (*check || *migrate) && !path.exists() {
            warning(format!(
                "No configuration file at {} (run `init` first).",
                path.display()
            ));
            return Ok(());
        }

        if *check {
            check_file(&path)?;
        }

        if *migrate {
            let added = migrate_file(&path)?;
            if !added.is_empty()
                && let Ok(pool) = DbPool::new(&cfg.database)
            {
                let _ = ttlog(
                    &pool.conn,
                    "config_migrate",
                    &path.to_string_lossy(),
                    &format!("Added keys: {}", added.join(", ")),
                );
            }
        }

        if *edit_config {
            let default_editor = platform_editor();
            let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

            match Command::new(&editor_to_use).arg(&path).status() {
                Ok(s) if s.success() => success(format!(
                    "Configuration file edited successfully using '{}'",
                    editor_to_use
                )),
                _ => {
                    warning(format!(
                        "Editor '{}' not available, falling back to '{}'",
                        editor_to_use, default_editor
                    ));

                    match Command::new(&default_editor).arg(&path).status() {
                        Ok(s) if s.success() => success(format!(
                            "Configuration file edited successfully using fallback '{}'",
                            default_editor
                        )),
                        _ => error(format!(
                            "Failed to edit configuration file using fallback '{}'",
                            default_editor
                        )),
                    }
                }
            }
        }
    }

    Ok(())
}
