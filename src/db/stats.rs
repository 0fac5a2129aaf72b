use crate::db::pool::DbPool;
use crate::db::queries::count_rows;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use std::fs;

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) ROW COUNTS
    //
    let sessions = count_rows(&pool.conn, "time_logs")?;
    let open: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM time_logs WHERE clock_out IS NULL",
        [],
        |row| row.get(0),
    )?;
    let auto: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM time_logs WHERE auto_terminated = 1",
        [],
        |row| row.get(0),
    )?;
    let breaks = count_rows(&pool.conn, "breaks")?;

    println!("{}• Sessions:{} {}{}{}", CYAN, RESET, GREEN, sessions, RESET);
    println!("    open:            {}", open);
    println!("    auto-terminated: {}", auto);
    println!("{}• Breaks:{} {}{}{}", CYAN, RESET, GREEN, breaks, RESET);

    //
    // 3) CLOCK-IN RANGE
    //
    let (first, last): (Option<String>, Option<String>) = pool.conn.query_row(
        "SELECT MIN(clock_in), MAX(clock_in) FROM time_logs",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let first = first.unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let last = last.unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Clock-in range:{}", CYAN, RESET);
    println!("    from: {}", first);
    println!("    to:   {}", last);

    println!();
    Ok(())
}
