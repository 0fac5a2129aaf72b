use crate::cli::commands::employee_key;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::calculator::elapsed::{elapsed_work_seconds, total_break_seconds};
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries::list_sessions;
use crate::errors::AppResult;
use crate::models::project_time::SessionNotes;
use crate::utils::colors::{RESET, color_for_optional_field, color_for_session};
use crate::utils::formatting::{hours2readable, mins2readable};
use crate::utils::table::{Column, Table};
use crate::utils::time::{format_date_time, format_time_display};
use chrono::Utc;

const DEFAULT_LIMIT: usize = 10;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { limit } = cmd {
        let key = employee_key(cfg)?;
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        let sessions = list_sessions(&pool.conn, &key, Some(limit.unwrap_or(DEFAULT_LIMIT)))?;

        if sessions.is_empty() {
            println!("No sessions for {}.", key);
            return Ok(());
        }

        let now = Utc::now();
        let mut table = Table::new(vec![
            Column::new("ID"),
            Column::new("CLOCK IN"),
            Column::new("OUT"),
            Column::new("BREAKS"),
            Column::new("WORKED"),
            Column::new("HOURS"),
            Column::new("NOTES"),
        ]);

        for s in &sessions {
            let color = color_for_session(s.is_open(), s.auto_terminated);
            let out = s.clock_out.map(format_time_display);
            let out_cell = match (&out, s.auto_terminated) {
                (Some(t), true) => format!("{t} (auto)"),
                (Some(t), false) => t.clone(),
                (None, _) => "--:--".to_string(),
            };
            let end = s.clock_out.unwrap_or(now);

            table.add_row(vec![
                format!("{color}{}{RESET}", s.id),
                format_date_time(s.clock_in),
                format!("{}{}{}", color_for_optional_field(out.as_deref()), out_cell, RESET),
                mins2readable(total_break_seconds(s, end) / 60, false, true),
                mins2readable(elapsed_work_seconds(s, now) / 60, false, false),
                hours2readable(s.total_hours),
                SessionNotes::decode(&s.notes).text,
            ]);
        }

        println!("📅 Sessions for {}:\n", key);
        print!("{}", table.render());
    }

    Ok(())
}
