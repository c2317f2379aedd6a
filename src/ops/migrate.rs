//! The migration engine: moving tasks forward between containers.
//!
//! Migration rewrites two text files and then refreshes both in the index.
//! The engine captures both files' bytes before touching either, and any
//! failure after the first write restores the captured bytes, so the corpus
//! is never left half-migrated.

use crate::config::Config;
use crate::constants::DATE_FORMAT_ISO;
use crate::db::{entries, Database};
use crate::db::entries::EntryFilter;
use crate::errors::{AppResult, DatabaseError, MigrationError};
use crate::index::Reindexer;
use crate::journal;
use crate::model::{EntryRecord, TaskStatus};
use crate::ops::done::verify_open_task;
use crate::parser::{add_migration_hint, render_migrated_entry, update_task_status};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where a task migrates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A monthly log's Tasks section.
    Monthly { year: i32, month: u32 },
    /// The future log's Someday section.
    FutureSomeday,
    /// A month section of the future log (`YYYY-MM`).
    FutureMonth(String),
    /// A specific daily log.
    Daily(NaiveDate),
    /// An existing collection.
    Collection(String),
}

impl Destination {
    /// Parses a destination string.
    ///
    /// Accepted forms: `YYYY-MM` or `monthly/YYYY-MM`, `YYYY-MM-DD`,
    /// `future` or `future/someday`, `future/YYYY-MM`, and
    /// `collection/<name>` (or a bare collection name as a fallback).
    pub fn parse(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MigrationError::InvalidDestination(s.to_string()).into());
        }

        // Date- and month-shaped strings are never collection names, so a
        // malformed one is an error rather than a fallback.
        if is_date_shape(s.as_bytes()) {
            return match NaiveDate::parse_from_str(s, DATE_FORMAT_ISO) {
                Ok(date) => Ok(Destination::Daily(date)),
                Err(_) => Err(MigrationError::InvalidDestination(s.to_string()).into()),
            };
        }
        if is_month_shape(s.as_bytes()) {
            return match parse_month_key(s) {
                Some((year, month)) => Ok(Destination::Monthly { year, month }),
                None => Err(MigrationError::InvalidDestination(s.to_string()).into()),
            };
        }
        if let Some(rest) = s.strip_prefix("monthly/") {
            return match parse_month_key(rest) {
                Some((year, month)) => Ok(Destination::Monthly { year, month }),
                None => Err(MigrationError::InvalidDestination(s.to_string()).into()),
            };
        }
        if s.eq_ignore_ascii_case("future") || s.eq_ignore_ascii_case("future/someday") {
            return Ok(Destination::FutureSomeday);
        }
        if let Some(rest) = s.strip_prefix("future/") {
            return match parse_month_key(rest) {
                Some(_) => Ok(Destination::FutureMonth(rest.to_string())),
                None => Err(MigrationError::InvalidDestination(s.to_string()).into()),
            };
        }
        if let Some(name) = s.strip_prefix("collection/") {
            if name.is_empty() {
                return Err(MigrationError::InvalidDestination(s.to_string()).into());
            }
            return Ok(Destination::Collection(name.to_string()));
        }

        // Bare names fall through to collections.
        Ok(Destination::Collection(s.to_string()))
    }

    /// The status character the source line takes on for this destination:
    /// `<` when parking the task in the future log, `>` for every other move.
    fn source_status(&self) -> TaskStatus {
        match self {
            Destination::FutureSomeday | Destination::FutureMonth(_) => TaskStatus::Scheduled,
            _ => TaskStatus::Migrated,
        }
    }
}

// Shape checks work on bytes: a multibyte character can make the byte length
// match while sitting across a char boundary, so the string is never sliced.
fn is_month_shape(b: &[u8]) -> bool {
    b.len() == 7
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..].iter().all(u8::is_ascii_digit)
}

fn is_date_shape(b: &[u8]) -> bool {
    b.len() == 10
        && is_month_shape(&b[..7])
        && b[7] == b'-'
        && b[8..].iter().all(u8::is_ascii_digit)
}

fn parse_month_key(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

/// Migrates an open task to another container.
///
/// # Flow
///
/// 1. Resolve the reference and verify it is an open task
/// 2. Verify the source line on disk still matches the index
/// 3. Rewrite the source line: status becomes `[>]` (or `[<]` for a
///    future-log destination) plus a `→destination` hint
/// 4. Append an open copy with a `←source` back-pointer to the destination,
///    rolling both files back if the write fails
/// 5. Reindex both files and return the new destination entry
///
/// # Errors
///
/// `MigrationError` variants for anything from a bad destination string to a
/// stale source line; in every error case the files are as they were before.
pub fn migrate_task(
    db: &Database,
    config: &Config,
    entry_ref: &str,
    destination: &Destination,
) -> AppResult<EntryRecord> {
    let conn = db.get_conn()?;
    let entry = entries::resolve_ref(&conn, entry_ref)?;
    drop(conn);
    verify_open_task(&entry)?;

    let source_path = config.data_dir.join(&entry.source_file);
    let dest_path = resolve_destination_path(config, destination)?;
    let dest_rel = journal::relative_path(&config.data_dir, &dest_path);
    if dest_rel == entry.source_file {
        return Err(MigrationError::InvalidDestination(format!(
            "{} (task already lives there)",
            dest_rel
        ))
        .into());
    }

    // Stale-line guard before any write.
    let source_lines = journal::read_lines(&source_path)?;
    if entry.line_number == 0
        || source_lines.get(entry.line_number - 1) != Some(&entry.raw_line)
    {
        return Err(MigrationError::StaleSourceLine {
            file: entry.source_file.clone(),
            line: entry.line_number,
        }
        .into());
    }

    // Capture both files for rollback.
    let source_before = fs::read(&source_path)?;
    let dest_before: Option<Vec<u8>> = match fs::read(&dest_path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    // Rewrite the source line.
    let status = destination.source_status();
    let rewritten = add_migration_hint(&update_task_status(&entry.raw_line, status), &dest_rel);
    journal::update_line(&source_path, entry.line_number, &rewritten)?;

    // Append to the destination; restore both files on failure.
    let dest_line = render_migrated_entry(
        &entry.content,
        &entry.source_file,
        entry.signifier,
        &config.signifiers,
    );
    if let Err(e) = append_to_destination(config, destination, &dest_path, &dest_line) {
        warn!("Migration write failed, rolling back: {}", e);
        fs::write(&source_path, &source_before)?;
        match &dest_before {
            Some(bytes) => fs::write(&dest_path, bytes)?,
            None => {
                let _ = fs::remove_file(&dest_path);
            }
        }
        let source = match e {
            crate::errors::AppError::Io(io) => io,
            other => std::io::Error::other(other.to_string()),
        };
        return Err(MigrationError::DestinationUnwritable {
            path: dest_path,
            source,
        }
        .into());
    }

    info!(
        "Migrated task {} from {} to {}",
        entry.entry_ref, entry.source_file, dest_rel
    );

    let reindexer = Reindexer::new(db, &config.data_dir, &config.signifiers);
    reindexer.reindex_file(&source_path)?;
    reindexer.reindex_file(&dest_path)?;

    // The destination copy is the row in the destination file pointing back
    // at the source with the same content; ties go to the latest line.
    let conn = db.get_conn()?;
    let rows = entries::list_entries(
        &conn,
        &EntryFilter {
            source_file: Some(dest_rel.clone()),
            ..Default::default()
        },
    )?;
    rows.into_iter()
        .filter(|e| {
            e.content == entry.content && e.migrated_from.as_deref() == Some(entry.source_file.as_str())
        })
        .max_by_key(|e| e.line_number)
        .ok_or_else(|| DatabaseError::NotFound(format!("migrated copy in {}", dest_rel)).into())
}

/// Schedules an open task into the future log, marking the source `[<]`.
///
/// `month` names a `YYYY-MM` section of the future log; `None` parks the
/// task in the Someday section.
pub fn schedule_task(
    db: &Database,
    config: &Config,
    entry_ref: &str,
    month: Option<&str>,
) -> AppResult<EntryRecord> {
    let destination = match month {
        Some(m) => match parse_month_key(m) {
            Some(_) => Destination::FutureMonth(m.to_string()),
            None => return Err(MigrationError::InvalidDestination(m.to_string()).into()),
        },
        None => Destination::FutureSomeday,
    };
    migrate_task(db, config, entry_ref, &destination)
}

fn resolve_destination_path(config: &Config, destination: &Destination) -> AppResult<PathBuf> {
    match destination {
        Destination::Monthly { year, month } => {
            Ok(journal::monthly_path(&config.data_dir, *year, *month))
        }
        Destination::FutureSomeday | Destination::FutureMonth(_) => {
            Ok(journal::future_path(&config.data_dir))
        }
        Destination::Daily(date) => Ok(journal::daily_path(&config.data_dir, *date)),
        Destination::Collection(name) => {
            let path = journal::collection_path(&config.data_dir, name);
            if !path.exists() {
                return Err(MigrationError::CollectionNotFound(name.clone()).into());
            }
            Ok(path)
        }
    }
}

fn append_to_destination(
    config: &Config,
    destination: &Destination,
    dest_path: &Path,
    line: &str,
) -> AppResult<()> {
    match destination {
        Destination::Monthly { year, month } => {
            journal::create_monthly_file(&config.data_dir, *year, *month)?;
            journal::append_to_section(dest_path, "Tasks", line)?;
        }
        Destination::FutureSomeday => {
            journal::create_future_file(&config.data_dir)?;
            journal::append_to_section(dest_path, "Someday", line)?;
        }
        Destination::FutureMonth(month) => {
            journal::create_future_file(&config.data_dir)?;
            journal::append_to_section(dest_path, month, line)?;
        }
        Destination::Daily(date) => {
            journal::create_daily_file(&config.data_dir, *date)?;
            journal::append_line(dest_path, line)?;
        }
        Destination::Collection(_) => {
            journal::append_line(dest_path, line)?;
        }
    }
    Ok(())
}
