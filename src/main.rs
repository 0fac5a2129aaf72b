//! rTimeclock main entrypoint.

use clap::Parser;
use rtimeclock::cli::parser::Cli;
use rtimeclock::{resolve_config, run};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match resolve_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing("warn");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg.log_level);

    println!();
    if let Err(e) = run(cli, cfg).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
