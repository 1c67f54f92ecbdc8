//! Shared types for the studylog application.
//!
//! This module holds the crate-wide Result alias and the command
//! definitions used by the command-line front end.
use std::path::PathBuf;

use clap::Subcommand;

use crate::StudyError;

/// A specialized Result type for studylog operations.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Available subcommands for the studylog application
#[derive(Subcommand)]
pub enum Commands {
    /// Log a study session
    Log {
        /// Subject studied
        #[clap(short, long)]
        subject: String,

        /// Experience points earned
        #[clap(short, long)]
        xp: String,

        /// Minutes studied
        #[clap(short, long)]
        minutes: String,

        /// Notes about the session
        #[clap(short, long, default_value = "")]
        notes: String,
    },

    /// List logged sessions
    List {
        /// Only show sessions whose subject contains this text
        #[clap(short, long)]
        filter: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show one session with its notes in full
    Show {
        /// Row number as printed by `list`
        row: usize,

        /// Filter the row number refers to
        #[clap(short, long)]
        filter: Option<String>,
    },

    /// Sort the log by subject (saved)
    Sort,

    /// Delete sessions by row number
    Delete {
        /// Row numbers as printed by `list`
        #[clap(required = true)]
        rows: Vec<usize>,

        /// Filter the row numbers refer to
        #[clap(short, long)]
        filter: Option<String>,

        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },

    /// Show level progress and study time per day
    Stats,

    /// List or add subjects
    Subjects {
        /// Subject to add
        #[clap(short, long)]
        add: Option<String>,
    },

    /// Journal operations
    #[clap(subcommand)]
    Journal(JournalCommands),

    /// Run the break timer
    Timer {
        /// Break length in minutes (0-180)
        #[clap(short, long, default_value_t = 5)]
        minutes: u32,

        /// Additional seconds (0-59)
        #[clap(short, long, default_value_t = 0)]
        seconds: u32,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (data_dir=..., alarm_sound=...)
        #[clap(short, long)]
        set: Option<String>,

        /// Choose the data folder again
        #[clap(short, long)]
        reset: bool,
    },
}

/// Journal subcommands
#[derive(Subcommand)]
pub enum JournalCommands {
    /// Add a journal entry
    Add {
        /// Entry content (markup is kept as written)
        #[clap(short, long)]
        content: Option<String>,

        /// Read content from a file
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Write the entry as Markdown in your editor
        #[clap(short, long)]
        edit: bool,

        /// Files to attach
        #[clap(short, long)]
        attach: Vec<PathBuf>,

        /// Title (defaults to the date and time)
        #[clap(short = 'T', long)]
        title: Option<String>,
    },

    /// Show entries grouped by year, month and day
    Tree {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show one entry
    Show {
        /// Entry ID as printed by `journal tree`
        id: String,

        /// Print the stored markup instead of plain text
        #[clap(short, long)]
        raw: bool,
    },

    /// Rename an entry
    Rename {
        /// Entry ID
        id: String,

        /// New title
        title: String,
    },

    /// Delete an entry (attachment files are kept)
    Delete {
        /// Entry ID
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}
