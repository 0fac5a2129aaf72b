//! Live session view. While it runs, the grace period is enforced: the
//! warning and the automatic clock-out fire from here.

use crate::cli::commands::open_tracker;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::monitor::GracePoller;
use crate::core::timer::Timer;
use crate::errors::AppResult;
use crate::ui::messages::info;
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::{self, Instant};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Watch { seconds } = cmd else {
        return Ok(());
    };

    let tracker = open_tracker(cfg).await?;
    let state = tracker.snapshot();

    if !state.is_tracking {
        info("Not clocked in, nothing to watch.");
        return Ok(());
    }

    let poll_every = Duration::from_secs(cfg.grace_poll_seconds.max(1));
    let mut poller = GracePoller::new(poll_every);
    poller.sync(&tracker);

    let mut timer = Timer::new(tracker.elapsed_now());
    timer.set_running(!state.is_on_break);

    let stop_at = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let stop = async {
        match stop_at {
            Some(at) => time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(stop, ctrl_c);
    let mut redraw = time::interval(Duration::from_secs(1));
    let mut resync = time::interval_at(Instant::now() + poll_every, poll_every);

    info("Watching the open session (Ctrl-C to stop).");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = &mut stop => break,
            _ = resync.tick() => {
                // other processes may have ended the session or a break
                if let Err(e) = tracker.refresh().await {
                    tracing::warn!("refresh failed: {}", e);
                }
                let state = tracker.snapshot();
                timer.reset(tracker.elapsed_now());
                timer.set_running(state.is_tracking && !state.is_on_break);
                poller.sync(&tracker);
            }
            _ = redraw.tick() => {
                let state = tracker.snapshot();
                if !state.is_tracking {
                    timer.set_running(false);
                    println!();
                    info("Session closed.");
                    break;
                }
                let marker = if state.is_on_break {
                    " (on break)"
                } else if state.in_grace_period {
                    " (grace period)"
                } else {
                    ""
                };
                print!("\r⏱  {}{}   ", timer.display(), marker);
                io::stdout().flush().ok();
            }
        }
    }

    poller.stop();
    println!();
    Ok(())
}
