//! Migration history of a task.
//!
//! Migration leaves a breadcrumb pair behind: the source line carries
//! `→destination` and the destination copy carries `←source`. Following the
//! pair in both directions reconstructs the whole chain for a task, oldest
//! hop first, from the text alone.

use crate::constants::MAX_MIGRATION_HOPS;
use crate::db::{entries, Database};
use crate::db::entries::EntryFilter;
use crate::errors::AppResult;
use crate::model::EntryRecord;
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Returns the full migration chain containing the referenced entry,
/// ordered from the original entry to the most recent copy.
///
/// Traversal is bounded and cycle-guarded: corrupted hints (a loop or an
/// absurdly long chain) end the walk rather than hanging it.
pub fn task_history(db: &Database, entry_ref: &str) -> AppResult<Vec<EntryRecord>> {
    let conn = db.get_conn()?;
    let entry = entries::resolve_ref(&conn, entry_ref)?;

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(entry.entry_ref.clone());

    // Walk backwards to the origin.
    let mut chain = vec![entry.clone()];
    let mut current = entry.clone();
    for _ in 0..MAX_MIGRATION_HOPS {
        let Some(prev) = predecessor(&conn, &current)? else {
            break;
        };
        if !visited.insert(prev.entry_ref.clone()) {
            warn!("Migration hint cycle at {}; stopping walk", prev.entry_ref);
            break;
        }
        chain.insert(0, prev.clone());
        current = prev;
    }

    // Walk forwards to the terminal copy.
    let mut current = entry;
    for _ in 0..MAX_MIGRATION_HOPS {
        let Some(next) = successor(&conn, &current)? else {
            break;
        };
        if !visited.insert(next.entry_ref.clone()) {
            warn!("Migration hint cycle at {}; stopping walk", next.entry_ref);
            break;
        }
        chain.push(next.clone());
        current = next;
    }

    debug!("History for {}: {} hop(s)", entry_ref, chain.len());
    Ok(chain)
}

/// The entry this one was migrated from, if its back-pointer resolves.
fn predecessor(conn: &Connection, entry: &EntryRecord) -> AppResult<Option<EntryRecord>> {
    let Some(source_file) = &entry.migrated_from else {
        return Ok(None);
    };
    let rows = entries::list_entries(
        conn,
        &EntryFilter {
            source_file: Some(source_file.clone()),
            ..Default::default()
        },
    )?;
    Ok(rows
        .into_iter()
        .filter(|e| {
            e.content == entry.content
                && e.migrated_to.as_deref() == Some(entry.source_file.as_str())
        })
        .max_by_key(|e| e.line_number))
}

/// The copy this entry was migrated to, if its forward hint resolves.
fn successor(conn: &Connection, entry: &EntryRecord) -> AppResult<Option<EntryRecord>> {
    let Some(dest_file) = &entry.migrated_to else {
        return Ok(None);
    };
    let rows = entries::list_entries(
        conn,
        &EntryFilter {
            source_file: Some(dest_file.clone()),
            ..Default::default()
        },
    )?;
    Ok(rows
        .into_iter()
        .filter(|e| {
            e.content == entry.content
                && e.migrated_from.as_deref() == Some(entry.source_file.as_str())
        })
        .max_by_key(|e| e.line_number))
}
