use clap::{Parser, Subcommand};

/// Command-line interface definition for rTaskSync
/// Mirror a remote task table locally, edit it and track time against it.
#[derive(Parser)]
#[command(
    name = "rtasksync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sync a remote task table, edit rows and track working time from the terminal",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

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

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Connect to a remote table and infer its column mapping
    Connect {
        #[command(subcommand)]
        target: ConnectTarget,
    },

    /// List the tables visible with the stored credentials
    Tables,

    /// Show or override the role → column mapping
    Map {
        /// role=column_id, repeatable
        #[arg(long = "set", value_name = "ROLE=COLUMN")]
        set: Vec<String>,

        #[arg(long = "clear", value_name = "ROLE")]
        clear: Vec<String>,

        #[arg(long = "reinfer", help = "Fill unmapped roles from column names")]
        reinfer: bool,
    },

    /// Fetch and print rows, optionally filtered
    Rows {
        #[arg(long, help = "Only rows whose group/status equals this value")]
        group: Option<String>,

        #[arg(long, help = "Only rows assigned to this value")]
        assignee: Option<String>,

        #[arg(long = "all", help = "Skip the default weekday filter")]
        all: bool,
    },

    /// List distinct values of a mapped role
    Facets {
        /// group, assignee, status, priority...
        role: String,
    },

    /// Edit one row: progress, other mapped fields, or append a note
    Edit {
        row_id: String,

        #[arg(long, value_name = "PERCENT")]
        progress: Option<u8>,

        /// role=value, repeatable
        #[arg(long = "set", value_name = "ROLE=VALUE")]
        set: Vec<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Keep the mirror fresh and show the refresh countdown
    Watch {
        #[arg(long, value_name = "SECS", help = "Refresh interval (default from config)")]
        interval: Option<u64>,

        #[arg(long)]
        group: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        /// Stop after N countdown ticks
        #[arg(long, hide = true)]
        ticks: Option<u64>,
    },

    /// Week/month summary of the time-tracking tasks
    Period {
        #[arg(long, help = "Month label, e.g. \"Mars 2025\"")]
        month: Option<String>,

        #[arg(long, help = "Week label, e.g. S2")]
        week: Option<String>,

        #[arg(long, help = "Search title or client (ignores month/week)")]
        search: Option<String>,
    },

    /// Update a time-tracking task
    Task {
        task_id: String,

        #[arg(long, value_name = "PERCENT")]
        progress: Option<u8>,

        #[arg(long, conflicts_with = "reopen")]
        done: bool,

        #[arg(long)]
        reopen: bool,
    },

    /// Start, stop or inspect the task timer
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Forget the stored connection and any running timer
    Disconnect,
}

#[derive(Subcommand)]
pub enum ConnectTarget {
    /// Document-table API with a bearer token
    Document {
        #[arg(long)]
        token: String,

        /// Document URL (ids are extracted from it)
        #[arg(long)]
        url: Option<String>,

        #[arg(long = "doc")]
        doc_id: Option<String>,

        #[arg(long = "table")]
        table_id: Option<String>,
    },

    /// Relational REST endpoint with a project URL and anon key
    Relational {
        #[arg(long)]
        url: String,

        #[arg(long)]
        key: String,

        /// Table name; probed from common names when omitted
        #[arg(long)]
        table: Option<String>,

        /// Owner of time entries
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TimerAction {
    Start { task_id: String },
    Stop,
    Status {
        #[arg(long, help = "Keep the elapsed time ticking until Ctrl-C")]
        follow: bool,

        /// Stop following after N ticks
        #[arg(long, hide = true)]
        ticks: Option<u64>,
    },
}
