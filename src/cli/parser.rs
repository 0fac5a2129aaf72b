use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rTimeclock
/// CLI application to clock in/out, track breaks and enforce the end-of-day grace period
#[derive(Parser)]
#[command(
    name = "rtimeclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Employee time clock: sessions, breaks and automatic end-of-day clock-out on SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Employee to act on (overrides `employee_id` from the config)
    #[arg(global = true, long = "employee", short = 'e')]
    pub employee: Option<String>,

    /// Organization the employee belongs to (overrides `organization_id`)
    #[arg(global = true, long = "org")]
    pub org: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "limit", help = "Only the most recent N rows")]
        limit: Option<usize>,
    },

    /// Clock in: open a new work session
    In {
        #[arg(long = "note", help = "Free-text note attached to the session")]
        note: Option<String>,

        #[arg(
            long = "project",
            value_name = "NAME=HOURS",
            help = "Planned hours per project (repeatable), e.g. --project backend=3.5"
        )]
        projects: Vec<String>,
    },

    /// Clock out: close the open session
    Out {
        #[arg(long = "note", help = "Replace the session note before closing")]
        note: Option<String>,

        #[arg(long = "yes", short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Start or end a break in the open session
    Break {
        #[command(subcommand)]
        action: BreakAction,
    },

    /// Show the open session, elapsed work time and grace status
    Status,

    /// List recent sessions
    List {
        #[arg(long = "limit", short = 'n', help = "Number of sessions to show")]
        limit: Option<usize>,
    },

    /// Live view of the open session; enforces the grace period while running
    Watch {
        #[arg(long = "seconds", help = "Stop after N seconds (default: until Ctrl-C)")]
        seconds: Option<u64>,
    },

    /// Export sessions to CSV or JSON
    Export {
        #[arg(long = "format", value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long = "file", value_name = "FILE", help = "Output file")]
        file: String,

        #[arg(long = "force", help = "Overwrite the output file without asking")]
        force: bool,
    },

    /// Resume validation jobs
    Job {
        #[command(subcommand)]
        action: JobAction,
    },
}

#[derive(Subcommand)]
pub enum BreakAction {
    /// Start a break
    Start {
        #[arg(long = "kind", help = "lunch, short, personal or other")]
        kind: Option<String>,
    },
    /// End the running break
    End,
}

#[derive(Subcommand)]
pub enum JobAction {
    /// Submit a resume for validation
    Submit {
        #[arg(long = "candidate")]
        candidate: String,

        #[arg(long = "resume-url")]
        resume_url: String,

        #[arg(long = "wait", help = "Wait until the job completes or fails")]
        wait: bool,
    },
    /// Wait for a submitted job
    Wait { job_id: String },
}
