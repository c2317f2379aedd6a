//! Command-line interface definition.

use crate::constants::{APP_DESCRIPTION, APP_NAME};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add an entry to a daily log
    Add {
        /// Entry text
        content: String,

        /// Entry kind: task, event, or note
        #[arg(short = 't', long = "type", default_value = "task")]
        entry_type: String,

        /// Signifier symbol to prepend (e.g. `*` for priority)
        #[arg(short = 's', long)]
        signifier: Option<char>,

        /// Date of the daily log (YYYY-MM-DD, defaults to today)
        #[arg(short = 'd', long)]
        date: Option<String>,
    },

    /// List indexed entries
    List {
        /// Only entries of this kind (task, event, note)
        #[arg(short = 't', long = "type")]
        entry_type: Option<String>,

        /// Only tasks with this status (open, complete, migrated, scheduled, cancelled)
        #[arg(long)]
        status: Option<String>,

        /// Only entries carrying this signifier symbol (e.g. `*`)
        #[arg(short = 's', long)]
        signifier: Option<char>,

        /// Only entries from this daily date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: Option<String>,

        /// Only entries dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only entries dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only entries from this month (YYYY-MM)
        #[arg(short = 'm', long)]
        month: Option<String>,

        /// Only entries from this collection
        #[arg(short = 'c', long)]
        collection: Option<String>,

        /// Maximum number of entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Full-text search over entry content
    Search {
        /// Search query (FTS5 syntax)
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Mark a task complete
    Done {
        /// Entry reference (full or unambiguous prefix)
        entry_ref: String,
    },

    /// Migrate a task to another container
    Migrate {
        /// Entry reference (full or unambiguous prefix)
        entry_ref: String,

        /// Destination: YYYY-MM, future[/YYYY-MM|/someday], or collection/<name>
        destination: String,
    },

    /// Schedule a task into the future log
    Schedule {
        /// Entry reference (full or unambiguous prefix)
        entry_ref: String,

        /// Future-log target: a month (YYYY-MM) or `someday`
        when: String,
    },

    /// Show the migration history of a task
    History {
        /// Entry reference (full or unambiguous prefix)
        entry_ref: String,
    },

    /// Rebuild or refresh the index from the text files
    Reindex {
        /// Clear the index and rebuild from every file
        #[arg(long)]
        full: bool,
    },

    /// Show aggregate statistics over the index
    Stats {
        /// Restrict counts to one year (YYYY)
        #[arg(long, conflicts_with = "month")]
        year: Option<String>,

        /// Restrict counts to one month (YYYY-MM)
        #[arg(short = 'm', long)]
        month: Option<String>,
    },

    /// Pull, reindex, commit, and push the corpus
    Sync,

    /// Open a daily log in the editor
    Open {
        /// Date of the daily log (YYYY-MM-DD, defaults to today)
        #[arg(short = 'd', long)]
        date: Option<String>,
    },
}

/// Parses a user-supplied date argument, `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
}
