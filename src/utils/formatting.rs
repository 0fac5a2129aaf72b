//! Formatting utilities used for CLI and export outputs.

/// Seconds → `HH:MM:SS`. Negative input renders as zero.
pub fn format_time(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

pub fn mins2readable(mins: i64, want_sign: bool, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;

    let sign = if mins > 0 && want_sign {
        "+"
    } else if mins < 0 && want_sign {
        "-"
    } else {
        ""
    };

    if short {
        // es: +02:25 oppure -01:10
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        // es: +02h 25m oppure -01h 10m
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

pub fn hours2readable(hours: Option<f64>) -> String {
    match hours {
        Some(h) => mins2readable((h * 60.0).round() as i64, false, false),
        None => "--:--".to_string(),
    }
}
