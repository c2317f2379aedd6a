//! Entry rows: insertion, lookup, filtered listing, and full-text search.

use crate::constants::DATE_FORMAT_ISO;
use crate::errors::{AppResult, DatabaseError};
use crate::model::{EntryRecord, EntryType, Signifier, TaskStatus};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::debug;

/// An entry about to be inserted into the index.
///
/// Borrowed view over parsed data; the reindexer builds one per entry from a
/// `ParsedEntry` plus its container and allocated reference.
#[derive(Debug)]
pub struct NewEntry<'a> {
    pub entry_ref: &'a str,
    pub source_file: &'a str,
    pub line_number: usize,
    pub raw_line: &'a str,
    pub entry_type: EntryType,
    pub status: Option<TaskStatus>,
    pub signifier: Option<Signifier>,
    pub content: &'a str,
    pub entry_date: Option<NaiveDate>,
    pub month: Option<&'a str>,
    pub collection: Option<&'a str>,
    pub migrated_to: Option<&'a str>,
    pub migrated_from: Option<&'a str>,
}

/// Inserts one entry row.
///
/// # Errors
///
/// Returns [`DatabaseError::RefCollision`] if the reference already exists,
/// which aborts (and rolls back) the enclosing file transaction.
pub fn insert_entry(conn: &Connection, entry: &NewEntry<'_>) -> AppResult<()> {
    let result = conn.execute(
        "INSERT INTO entries (
            entry_ref, source_file, line_number, raw_line,
            entry_type, status, signifier, content,
            entry_date, month, collection, migrated_to, migrated_from
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entry.entry_ref,
            entry.source_file,
            entry.line_number as i64,
            entry.raw_line,
            entry.entry_type.as_str(),
            entry.status.map(|s| s.as_str()),
            entry.signifier.map(|s| s.as_str()),
            entry.content,
            entry.entry_date.map(|d| d.format(DATE_FORMAT_ISO).to_string()),
            entry.month,
            entry.collection,
            entry.migrated_to,
            entry.migrated_from,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(DatabaseError::RefCollision {
            entry_ref: entry.entry_ref.to_string(),
            file: entry.source_file.to_string(),
        }
        .into()),
        Err(e) => Err(DatabaseError::Sqlite(e).into()),
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Deletes all entries indexed from `source_file`. Returns the count removed.
pub fn delete_entries_for_file(conn: &Connection, source_file: &str) -> AppResult<usize> {
    let n = conn
        .execute("DELETE FROM entries WHERE source_file = ?1", [source_file])
        .map_err(DatabaseError::Sqlite)?;
    debug!("Removed {} entries for {}", n, source_file);
    Ok(n)
}

/// Empties the entries table (full reindex start).
pub fn clear_all(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM entries", [])
        .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

const ENTRY_COLUMNS: &str = "id, entry_ref, source_file, line_number, raw_line, \
     entry_type, status, signifier, content, entry_date, month, collection, \
     migrated_to, migrated_from, created_at, completed_at";

/// Looks up an entry by its exact reference.
pub fn get_entry_by_ref(conn: &Connection, entry_ref: &str) -> AppResult<Option<EntryRecord>> {
    let sql = format!("SELECT {} FROM entries WHERE entry_ref = ?1", ENTRY_COLUMNS);
    let result = conn.query_row(&sql, [entry_ref], row_to_entry);
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::Sqlite(e).into()),
    }
}

/// Resolves a full reference or unambiguous prefix to its entry.
///
/// # Errors
///
/// Returns [`DatabaseError::NotFound`] when nothing matches and
/// [`DatabaseError::AmbiguousRef`] when a prefix matches several entries.
pub fn resolve_ref(conn: &Connection, entry_ref: &str) -> AppResult<EntryRecord> {
    if let Some(entry) = get_entry_by_ref(conn, entry_ref)? {
        return Ok(entry);
    }

    // References are lowercase hex; anything else cannot be a valid prefix.
    if entry_ref.is_empty() || !entry_ref.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DatabaseError::NotFound(entry_ref.to_string()).into());
    }

    let sql = format!(
        "SELECT {} FROM entries WHERE entry_ref LIKE ?1 LIMIT 2",
        ENTRY_COLUMNS
    );
    let pattern = format!("{}%", entry_ref.to_lowercase());
    let mut stmt = conn.prepare(&sql).map_err(DatabaseError::Sqlite)?;
    let mut matches: Vec<EntryRecord> = stmt
        .query_map([pattern], row_to_entry)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<_, _>>()
        .map_err(DatabaseError::Sqlite)?;

    match matches.len() {
        0 => Err(DatabaseError::NotFound(entry_ref.to_string()).into()),
        1 => Ok(matches.remove(0)),
        _ => Err(DatabaseError::AmbiguousRef(entry_ref.to_string()).into()),
    }
}

/// Filter for listing entries. Unset fields do not constrain the result.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub status: Option<TaskStatus>,
    pub signifier: Option<Signifier>,
    pub entry_date: Option<NaiveDate>,
    /// Inclusive lower bound on the daily date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the daily date.
    pub date_to: Option<NaiveDate>,
    pub month: Option<String>,
    pub collection: Option<String>,
    pub source_file: Option<String>,
    pub limit: Option<usize>,
}

/// Lists entries matching `filter`, ordered by file then line number.
pub fn list_entries(conn: &Connection, filter: &EntryFilter) -> AppResult<Vec<EntryRecord>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = filter.entry_type {
        clauses.push(format!("entry_type = ?{}", args.len() + 1));
        args.push(Box::new(t.as_str()));
    }
    if let Some(s) = filter.status {
        clauses.push(format!("status = ?{}", args.len() + 1));
        args.push(Box::new(s.as_str()));
    }
    if let Some(s) = filter.signifier {
        clauses.push(format!("signifier = ?{}", args.len() + 1));
        args.push(Box::new(s.as_str()));
    }
    if let Some(d) = filter.entry_date {
        clauses.push(format!("entry_date = ?{}", args.len() + 1));
        args.push(Box::new(d.format(DATE_FORMAT_ISO).to_string()));
    }
    if let Some(d) = filter.date_from {
        clauses.push(format!("entry_date >= ?{}", args.len() + 1));
        args.push(Box::new(d.format(DATE_FORMAT_ISO).to_string()));
    }
    if let Some(d) = filter.date_to {
        clauses.push(format!("entry_date <= ?{}", args.len() + 1));
        args.push(Box::new(d.format(DATE_FORMAT_ISO).to_string()));
    }
    if let Some(m) = &filter.month {
        clauses.push(format!("month = ?{}", args.len() + 1));
        args.push(Box::new(m.clone()));
    }
    if let Some(c) = &filter.collection {
        clauses.push(format!("collection = ?{}", args.len() + 1));
        args.push(Box::new(c.clone()));
    }
    if let Some(f) = &filter.source_file {
        clauses.push(format!("source_file = ?{}", args.len() + 1));
        args.push(Box::new(f.clone()));
    }

    let mut sql = format!("SELECT {} FROM entries", ENTRY_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY source_file, line_number");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql).map_err(DatabaseError::Sqlite)?;
    let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(params.as_slice(), row_to_entry)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(rows)
}

/// A full-text search hit with a highlighted snippet.
#[derive(Debug)]
pub struct SearchHit {
    pub entry: EntryRecord,
    pub snippet: String,
}

/// Full-text search over entry content, best matches first.
pub fn search_entries(conn: &Connection, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
    let sql = format!(
        "SELECT {}, snippet(entries_fts, 0, '[', ']', '…', 12) AS snip
         FROM entries e
         JOIN entries_fts ON entries_fts.rowid = e.id
         WHERE entries_fts MATCH ?1
         ORDER BY rank
         LIMIT ?2",
        // Qualify the shared column list against the entries alias.
        ENTRY_COLUMNS
            .split(", ")
            .map(|c| format!("e.{}", c))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut stmt = conn.prepare(&sql).map_err(DatabaseError::Sqlite)?;
    let hits = stmt
        .query_map(params![query, limit as i64], |row| {
            let entry = row_to_entry(row)?;
            let snippet: String = row.get("snip")?;
            Ok(SearchHit { entry, snippet })
        })
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(hits)
}

/// Updates a task's status, rewritten raw line, and completion timestamp.
///
/// Called after the text file has been rewritten; keeps the index row in step
/// with the line on disk.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: TaskStatus,
    raw_line: &str,
) -> AppResult<()> {
    let completed = status == TaskStatus::Complete;
    conn.execute(
        "UPDATE entries SET
            status = ?1,
            raw_line = ?2,
            completed_at = CASE WHEN ?3 THEN CURRENT_TIMESTAMP ELSE NULL END
         WHERE id = ?4",
        params![status.as_str(), raw_line, completed, id],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Aggregate counts over the index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_entries: usize,
    pub tasks: usize,
    pub events: usize,
    pub notes: usize,
    pub open_tasks: usize,
    pub completed_tasks: usize,
    pub files_indexed: usize,
}

/// Computes aggregate statistics over the index.
///
/// `month_scope` narrows the entry counts to rows whose `month` column starts
/// with the given prefix (`"2024"` for a year, `"2024-03"` for one month).
/// `files_indexed` always covers the whole corpus.
pub fn collect_stats(conn: &Connection, month_scope: Option<&str>) -> AppResult<IndexStats> {
    let count = |condition: &str| -> AppResult<usize> {
        let mut sql = format!("SELECT COUNT(*) FROM entries WHERE {condition}");
        let n: i64 = match month_scope {
            Some(scope) => {
                sql.push_str(" AND month LIKE ?1 || '%'");
                conn.query_row(&sql, [scope], |row| row.get(0))
            }
            None => conn.query_row(&sql, [], |row| row.get(0)),
        }
        .map_err(DatabaseError::Sqlite)?;
        Ok(n as usize)
    };

    let files_indexed: i64 = conn
        .query_row("SELECT COUNT(*) FROM file_hashes", [], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?;

    Ok(IndexStats {
        total_entries: count("1=1")?,
        tasks: count("entry_type = 'task'")?,
        events: count("entry_type = 'event'")?,
        notes: count("entry_type = 'note'")?,
        open_tasks: count("status = 'open'")?,
        completed_tasks: count("status = 'complete'")?,
        files_indexed: files_indexed as usize,
    })
}

fn row_to_entry(row: &Row<'_>) -> Result<EntryRecord, rusqlite::Error> {
    let entry_type_str: String = row.get("entry_type")?;
    let status_str: Option<String> = row.get("status")?;
    let signifier_str: Option<String> = row.get("signifier")?;
    let date_str: Option<String> = row.get("entry_date")?;
    let line_number: i64 = row.get("line_number")?;

    Ok(EntryRecord {
        id: row.get("id")?,
        entry_ref: row.get("entry_ref")?,
        source_file: row.get("source_file")?,
        line_number: line_number as usize,
        raw_line: row.get("raw_line")?,
        entry_type: EntryType::from_str_opt(&entry_type_str).unwrap_or(EntryType::Note),
        status: status_str.as_deref().and_then(TaskStatus::from_str_opt),
        signifier: signifier_str.as_deref().and_then(Signifier::from_str_opt),
        content: row.get("content")?,
        entry_date: date_str
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT_ISO).ok()),
        month: row.get("month")?,
        collection: row.get("collection")?,
        migrated_to: row.get("migrated_to")?,
        migrated_from: row.get("migrated_from")?,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
    })
}
