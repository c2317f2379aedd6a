//! Adding entries to the journal.

use crate::config::Config;
use crate::db::{entries, Database};
use crate::db::entries::EntryFilter;
use crate::errors::{AppError, AppResult, DatabaseError};
use crate::index::Reindexer;
use crate::journal;
use crate::model::{EntryRecord, EntryType, ParsedEntry, Signifier, TaskStatus};
use chrono::NaiveDate;
use tracing::info;

/// Appends a new entry to a daily log and indexes it.
///
/// # Flow
///
/// 1. Render the canonical Markdown line for the entry
/// 2. Create the daily file if needed and append the line
/// 3. Reindex that file so the entry gets its reference
/// 4. Return the freshly indexed row (including the reference)
///
/// # Errors
///
/// Returns an error if the file cannot be written or the reindex fails.
pub fn add_entry(
    db: &Database,
    config: &Config,
    entry_type: EntryType,
    content: &str,
    signifier: Option<Signifier>,
    date: NaiveDate,
) -> AppResult<EntryRecord> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Journal("entry content cannot be empty".to_string()));
    }

    let entry = ParsedEntry {
        entry_type,
        content: content.to_string(),
        raw_line: String::new(),
        line_number: 0,
        status: if entry_type == EntryType::Task {
            Some(TaskStatus::Open)
        } else {
            None
        },
        signifier,
        migrated_to: None,
        migrated_from: None,
    };
    let line = entry.to_markdown(|sig| config.signifiers.symbol_for(sig));

    let path = journal::create_daily_file(&config.data_dir, date)?;
    let line_number = journal::append_line(&path, &line)?;
    info!("Added {} to {:?} at line {}", entry_type, path, line_number);

    let reindexer = Reindexer::new(db, &config.data_dir, &config.signifiers);
    reindexer.reindex_file(&path)?;

    let rel = journal::relative_path(&config.data_dir, &path);
    let conn = db.get_conn()?;
    let rows = entries::list_entries(
        &conn,
        &EntryFilter {
            source_file: Some(rel.clone()),
            ..Default::default()
        },
    )?;
    rows.into_iter()
        .find(|e| e.line_number == line_number)
        .ok_or_else(|| DatabaseError::NotFound(format!("{}:{}", rel, line_number)).into())
}
