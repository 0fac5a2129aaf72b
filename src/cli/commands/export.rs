use crate::cli::commands::employee_key;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::utils::path::absolutize;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        force,
    } = cmd
    {
        let key = employee_key(cfg)?;
        let path = absolutize(file)?;

        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        ExportLogic::export(
            &pool,
            &key,
            *format,
            &path.to_string_lossy(),
            *force,
            Utc::now(),
        )?;
    }
    Ok(())
}
