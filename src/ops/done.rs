//! Completing tasks.

use crate::config::Config;
use crate::db::{entries, Database};
use crate::errors::{AppResult, MigrationError};
use crate::index::Reindexer;
use crate::journal;
use crate::model::{EntryRecord, EntryType, TaskStatus};
use crate::parser::update_task_status;
use tracing::info;

/// Marks a task complete: `[ ]` becomes `[x]` in the text file, and the
/// index row follows.
///
/// # Flow
///
/// 1. Resolve the reference (full or unambiguous prefix)
/// 2. Verify the recorded line still matches the file on disk
/// 3. Rewrite the line with the new status character
/// 4. Update the index row and reindex the file
///
/// # Errors
///
/// Returns `MigrationError::NotATask` for events and notes,
/// `MigrationError::AlreadyClosed` when the task is not open, and
/// `MigrationError::StaleSourceLine` when the file changed under the index.
pub fn complete_task(db: &Database, config: &Config, entry_ref: &str) -> AppResult<EntryRecord> {
    let conn = db.get_conn()?;
    let entry = entries::resolve_ref(&conn, entry_ref)?;
    drop(conn);

    verify_open_task(&entry)?;

    let path = config.data_dir.join(&entry.source_file);
    let new_line = update_task_status(&entry.raw_line, TaskStatus::Complete);

    let current = journal::read_lines(&path)?;
    let on_disk = current.get(entry.line_number.saturating_sub(1));
    if entry.line_number == 0 || on_disk != Some(&entry.raw_line) {
        return Err(MigrationError::StaleSourceLine {
            file: entry.source_file.clone(),
            line: entry.line_number,
        }
        .into());
    }

    journal::update_line(&path, entry.line_number, &new_line)?;
    info!("Completed task {} in {}", entry.entry_ref, entry.source_file);

    // Reindex first so the file hash is current, then stamp the completion
    // time on the fresh row (the reference is content-derived and survives
    // the status change).
    let reindexer = Reindexer::new(db, &config.data_dir, &config.signifiers);
    reindexer.reindex_file(&path)?;

    let conn = db.get_conn()?;
    let reindexed = entries::resolve_ref(&conn, &entry.entry_ref)?;
    entries::update_status(&conn, reindexed.id, TaskStatus::Complete, &new_line)?;
    let updated = entries::resolve_ref(&conn, &entry.entry_ref)?;
    Ok(updated)
}

/// Checks that an entry is an open task.
pub(crate) fn verify_open_task(entry: &EntryRecord) -> AppResult<()> {
    if entry.entry_type != EntryType::Task {
        return Err(MigrationError::NotATask(entry.entry_ref.clone()).into());
    }
    match entry.status {
        Some(TaskStatus::Open) | None => Ok(()),
        Some(status) => Err(MigrationError::AlreadyClosed {
            entry_ref: entry.entry_ref.clone(),
            status: status.to_string(),
        }
        .into()),
    }
}
