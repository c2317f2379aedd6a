//! Data model for bullet journal entries.
//!
//! Entries are a tagged union over three kinds (task, event, note) sharing a
//! common set of fields; only tasks carry a status. `ParsedEntry` is what the
//! parser produces from one line of text, `EntryRecord` is the row shape the
//! index stores, and `Container` is the logical location an entry belongs to,
//! derived from its file path.

use crate::constants::{EVENT_GLYPH, MIGRATED_FROM_MARKER, MIGRATED_TO_MARKER, NOTE_MARKER};
use chrono::NaiveDate;
use std::fmt;

/// Kind of a bullet journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Task,
    Event,
    Note,
}

impl EntryType {
    /// Stable string form used in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Task => "task",
            EntryType::Event => "event",
            EntryType::Note => "note",
        }
    }

    /// Parses the stable string form.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "task" => Some(EntryType::Task),
            "event" => Some(EntryType::Event),
            "note" => Some(EntryType::Note),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a task entry.
///
/// The bracketed character in the line grammar maps one-to-one onto these
/// variants: `[ ]` open, `[x]` complete, `[>]` migrated, `[<]` scheduled,
/// `[~]` cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Open,
    Complete,
    Migrated,
    Scheduled,
    Cancelled,
}

impl TaskStatus {
    /// The status character used inside the task brackets.
    pub fn marker_char(&self) -> char {
        match self {
            TaskStatus::Open => ' ',
            TaskStatus::Complete => 'x',
            TaskStatus::Migrated => '>',
            TaskStatus::Scheduled => '<',
            TaskStatus::Cancelled => '~',
        }
    }

    /// Maps a status character back to its variant.
    pub fn from_marker_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(TaskStatus::Open),
            'x' => Some(TaskStatus::Complete),
            '>' => Some(TaskStatus::Migrated),
            '<' => Some(TaskStatus::Scheduled),
            '~' => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Stable string form used in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Complete => "complete",
            TaskStatus::Migrated => "migrated",
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the stable string form.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TaskStatus::Open),
            "complete" => Some(TaskStatus::Complete),
            "migrated" => Some(TaskStatus::Migrated),
            "scheduled" => Some(TaskStatus::Scheduled),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meaning attached to a leading signifier symbol.
///
/// The symbol-to-meaning mapping itself is configuration
/// (see [`crate::config::SignifierTable`]); this enum is the closed set of
/// meanings the rest of the system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signifier {
    Priority,
    Inspiration,
    Explore,
    Waiting,
    Delegated,
}

impl Signifier {
    /// Stable string form used in the index and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signifier::Priority => "priority",
            Signifier::Inspiration => "inspiration",
            Signifier::Explore => "explore",
            Signifier::Waiting => "waiting",
            Signifier::Delegated => "delegated",
        }
    }

    /// Parses the stable string form.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "priority" => Some(Signifier::Priority),
            "inspiration" => Some(Signifier::Inspiration),
            "explore" => Some(Signifier::Explore),
            "waiting" => Some(Signifier::Waiting),
            "delegated" => Some(Signifier::Delegated),
            _ => None,
        }
    }
}

impl fmt::Display for Signifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured entry recovered from one line of text.
///
/// `raw_line` holds the exact original text so the line can be rewritten in
/// place without disturbing anything the grammar did not claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub entry_type: EntryType,
    pub content: String,
    pub raw_line: String,
    /// 1-based line number at parse time. Advisory, not identity-bearing.
    pub line_number: usize,
    /// Only meaningful for tasks.
    pub status: Option<TaskStatus>,
    pub signifier: Option<Signifier>,
    pub migrated_to: Option<String>,
    pub migrated_from: Option<String>,
}

impl ParsedEntry {
    /// Renders the entry back to its canonical Markdown line.
    ///
    /// Parsing the result yields an entry equal to `self` apart from
    /// `raw_line` and `line_number` (the round-trip property).
    pub fn to_markdown(&self, signifier_char: impl Fn(Signifier) -> Option<char>) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(sig) = self.signifier {
            if let Some(c) = signifier_char(sig) {
                parts.push(c.to_string());
            }
        }

        match self.entry_type {
            EntryType::Task => {
                let status = self.status.unwrap_or(TaskStatus::Open);
                parts.push(format!("[{}]", status.marker_char()));
            }
            EntryType::Event => parts.push(EVENT_GLYPH.to_string()),
            EntryType::Note => parts.push(NOTE_MARKER.to_string()),
        }

        parts.push(self.content.clone());

        if let Some(dest) = &self.migrated_to {
            parts.push(format!("{}{}", MIGRATED_TO_MARKER, dest));
        }
        if let Some(src) = &self.migrated_from {
            parts.push(format!("{}{}", MIGRATED_FROM_MARKER, src));
        }

        parts.join(" ")
    }
}

/// Logical container an entry belongs to, derived from its file path.
///
/// Every indexed file maps to exactly one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// A daily log file (`daily/YYYY-MM-DD.md`).
    Daily(NaiveDate),
    /// A monthly log file (`months/YYYY-MM.md`). Key is `YYYY-MM`.
    Monthly(String),
    /// The future log (`future.md`).
    Future,
    /// The index page (`index.md`).
    IndexPage,
    /// A collection file. Name includes the type prefix when nested
    /// (`projects/reading-list`).
    Collection(String),
}

impl Container {
    /// The daily date, when this is a daily container.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Container::Daily(d) => Some(*d),
            _ => None,
        }
    }

    /// The `YYYY-MM` month key, for daily and monthly containers.
    pub fn month(&self) -> Option<String> {
        match self {
            Container::Daily(d) => Some(d.format(crate::constants::MONTH_FORMAT).to_string()),
            Container::Monthly(m) => Some(m.clone()),
            _ => None,
        }
    }

    /// The collection name, when this is a collection container.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Container::Collection(name) => Some(name),
            _ => None,
        }
    }
}

/// An entry as stored in the SQLite index.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub id: i64,
    pub entry_ref: String,
    pub source_file: String,
    pub line_number: usize,
    pub raw_line: String,
    pub entry_type: EntryType,
    pub status: Option<TaskStatus>,
    pub signifier: Option<Signifier>,
    pub content: String,
    pub entry_date: Option<NaiveDate>,
    pub month: Option<String>,
    pub collection: Option<String>,
    pub migrated_to: Option<String>,
    pub migrated_from: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}
