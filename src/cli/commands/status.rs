use crate::cli::commands::open_tracker;
use crate::config::Config;
use crate::core::calculator::expected::GracePhase;
use crate::errors::AppResult;
use crate::models::project_time::SessionNotes;
use crate::ui::messages::info;
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};
use crate::utils::formatting::format_time;
use crate::utils::time::{format_date_time, format_time_display};

pub async fn handle(cfg: &Config) -> AppResult<()> {
    let tracker = open_tracker(cfg).await?;
    let state = tracker.snapshot();

    let Some(session) = state.current.as_ref().filter(|_| state.is_tracking) else {
        info(format!(
            "{} is not clocked in.",
            state.employee.map(|k| k.to_string()).unwrap_or_default()
        ));
        return Ok(());
    };

    let elapsed = tracker.elapsed_now();
    let policy = tracker.policy();
    let now = tracker.now();

    println!();
    println!("{}• Session:{} {}", CYAN, RESET, session.id);
    println!(
        "{}• Clock-in:{} {}",
        CYAN,
        RESET,
        format_date_time(session.clock_in)
    );
    println!("{}• Worked:{} {}", CYAN, RESET, format_time(elapsed));

    if let Some(b) = &state.current_break {
        println!(
            "{}• On break:{} {} since {}",
            CYAN,
            RESET,
            b.kind.label(),
            format_time_display(b.start)
        );
    }

    let notes = SessionNotes::decode(&session.notes);
    if !notes.text.is_empty() {
        println!("{}• Notes:{} {}", CYAN, RESET, notes.text);
    }
    for p in &notes.projects {
        println!("    {:<20} {:>6.2} h", p.project, p.hours);
    }

    let expected = format_time_display(policy.expected_clock_out_time(session.clock_in));
    let deadline = format_time_display(policy.grace_deadline(session.clock_in));
    let phase = match policy.phase(session.clock_in, now) {
        GracePhase::Normal => format!("{GREEN}on schedule{RESET}"),
        GracePhase::Grace => format!("{YELLOW}grace period{RESET}"),
        GracePhase::Ended => format!("{RED}grace period over{RESET}"),
    };
    println!(
        "{}• Expected end:{} {} (auto clock-out at {}) - {}",
        CYAN, RESET, expected, deadline, phase
    );
    println!();

    Ok(())
}
