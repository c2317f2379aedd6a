//! The reindexer: derives the SQLite index from the text corpus.
//!
//! Three entry points share one per-file pipeline:
//!
//! - [`Reindexer::full_reindex`] clears the index and rebuilds from every file
//! - [`Reindexer::incremental_reindex`] touches only files whose content hash
//!   changed since the last pass, and forgets deleted files
//! - [`Reindexer::reindex_file`] refreshes a single file after a direct edit
//!
//! Each file is indexed in one transaction (delete old rows, insert new rows,
//! upsert the content hash), so a failure in one file rolls back that file
//! alone and the rest of the pass continues. Files containing unresolved
//! merge-conflict markers are skipped with their previous entries left in
//! place.

use crate::config::SignifierTable;
use crate::conflict::has_conflict_markers;
use crate::db::{entries, files, Database};
use crate::db::entries::NewEntry;
use crate::errors::AppResult;
use crate::journal::{determine_container, relative_path, walk_markdown_files};
use crate::model::Container;
use crate::refs::RefAllocator;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What happened to one file during an indexing pass.
#[derive(Debug, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was (re)parsed and its rows replaced.
    Indexed { entries: usize, prose_lines: usize },
    /// The content hash matched the recorded one; nothing to do.
    Unchanged,
    /// The file holds unresolved merge-conflict markers; left as indexed.
    SkippedConflict,
    /// The file no longer exists; its rows and hash were removed.
    Removed,
}

/// Summary of an indexing pass.
#[derive(Debug, Default)]
pub struct ReindexReport {
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub entries_indexed: usize,
    pub prose_lines: usize,
    /// Relative paths skipped because of merge-conflict markers.
    pub conflicted_files: Vec<String>,
    /// Relative paths that failed to index, with the failure message.
    pub failed_files: Vec<(String, String)>,
    pub duration: Duration,
}

impl ReindexReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Indexed { entries, prose_lines } => {
                self.files_indexed += 1;
                self.entries_indexed += entries;
                self.prose_lines += prose_lines;
            }
            FileOutcome::Unchanged => self.files_unchanged += 1,
            FileOutcome::Removed => self.files_removed += 1,
            FileOutcome::SkippedConflict => {}
        }
    }
}

/// Derives index state from corpus files.
pub struct Reindexer<'a> {
    db: &'a Database,
    data_dir: &'a Path,
    signifiers: &'a SignifierTable,
}

impl<'a> Reindexer<'a> {
    pub fn new(db: &'a Database, data_dir: &'a Path, signifiers: &'a SignifierTable) -> Self {
        Reindexer {
            db,
            data_dir,
            signifiers,
        }
    }

    /// Rebuilds the index from scratch.
    pub fn full_reindex(&self) -> AppResult<ReindexReport> {
        let start = Instant::now();
        info!("Starting full reindex of {:?}", self.data_dir);

        {
            let conn = self.db.get_conn()?;
            entries::clear_all(&conn)?;
            files::clear_all(&conn)?;
        }

        let mut report = ReindexReport::default();
        for path in walk_markdown_files(self.data_dir) {
            self.index_one(&path, false, &mut report);
        }

        report.duration = start.elapsed();
        info!(
            "Full reindex complete: {} files, {} entries in {:?}",
            report.files_indexed, report.entries_indexed, report.duration
        );
        Ok(report)
    }

    /// Refreshes only files whose content changed, and forgets deleted ones.
    pub fn incremental_reindex(&self) -> AppResult<ReindexReport> {
        let start = Instant::now();
        debug!("Starting incremental reindex of {:?}", self.data_dir);

        let mut report = ReindexReport::default();
        let on_disk = walk_markdown_files(self.data_dir);
        for path in &on_disk {
            self.index_one(path, true, &mut report);
        }

        // Files recorded in the index but gone from disk.
        let recorded = {
            let conn = self.db.get_conn()?;
            files::all_indexed_files(&conn)?
        };
        let present: std::collections::HashSet<String> = on_disk
            .iter()
            .map(|p| relative_path(self.data_dir, p))
            .collect();
        for rel in recorded {
            if !present.contains(&rel) {
                match self.remove_file_entries(&rel) {
                    Ok(()) => report.record(FileOutcome::Removed),
                    Err(e) => report.failed_files.push((rel, e.to_string())),
                }
            }
        }

        report.duration = start.elapsed();
        debug!(
            "Incremental reindex: {} changed, {} unchanged, {} removed in {:?}",
            report.files_indexed, report.files_unchanged, report.files_removed, report.duration
        );
        Ok(report)
    }

    /// Refreshes a single file unconditionally.
    pub fn reindex_file(&self, file_path: &Path) -> AppResult<FileOutcome> {
        let rel = relative_path(self.data_dir, file_path);
        self.index_file(file_path, &rel, false)
    }

    fn index_one(&self, path: &Path, skip_unchanged: bool, report: &mut ReindexReport) {
        let rel = relative_path(self.data_dir, path);
        match self.index_file(path, &rel, skip_unchanged) {
            Ok(FileOutcome::SkippedConflict) => {
                warn!("Skipping {}: unresolved merge conflict markers", rel);
                report.conflicted_files.push(rel);
            }
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!("Failed to index {}: {}", rel, e);
                report.failed_files.push((rel, e.to_string()));
            }
        }
    }

    /// Indexes one file inside a single transaction.
    fn index_file(
        &self,
        file_path: &Path,
        rel: &str,
        skip_unchanged: bool,
    ) -> AppResult<FileOutcome> {
        let content = match std::fs::read_to_string(file_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.remove_file_entries(rel)?;
                return Ok(FileOutcome::Removed);
            }
            Err(e) => return Err(e.into()),
        };

        let content_hash = blake3::hash(content.as_bytes()).to_hex().to_string();

        if skip_unchanged {
            let conn = self.db.get_conn()?;
            if files::get_file_hash(&conn, rel)?.as_deref() == Some(content_hash.as_str()) {
                return Ok(FileOutcome::Unchanged);
            }
        }

        if has_conflict_markers(&content) {
            return Ok(FileOutcome::SkippedConflict);
        }

        let parsed = crate::parser::parse_content(&content, self.signifiers);
        let container = determine_container(rel);
        let date_key = container_date_key(&container);

        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction().map_err(crate::errors::DatabaseError::Sqlite)?;

        entries::delete_entries_for_file(&tx, rel)?;

        let mut allocator = RefAllocator::new();
        let entry_count = parsed.entries.len();
        for entry in &parsed.entries {
            let entry_ref = allocator.allocate(rel, &entry.content, &date_key);
            entries::insert_entry(
                &tx,
                &NewEntry {
                    entry_ref: &entry_ref,
                    source_file: rel,
                    line_number: entry.line_number,
                    raw_line: &entry.raw_line,
                    entry_type: entry.entry_type,
                    status: entry.status,
                    signifier: entry.signifier,
                    content: &entry.content,
                    entry_date: container.date(),
                    month: container.month().as_deref(),
                    collection: container.collection(),
                    migrated_to: entry.migrated_to.as_deref(),
                    migrated_from: entry.migrated_from.as_deref(),
                },
            )?;
        }

        files::set_file_hash(&tx, rel, &content_hash)?;
        tx.commit().map_err(crate::errors::DatabaseError::Sqlite)?;

        debug!("Indexed {}: {} entries", rel, entry_count);
        Ok(FileOutcome::Indexed {
            entries: entry_count,
            prose_lines: parsed.prose_lines,
        })
    }

    fn remove_file_entries(&self, rel: &str) -> AppResult<()> {
        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction().map_err(crate::errors::DatabaseError::Sqlite)?;
        entries::delete_entries_for_file(&tx, rel)?;
        files::delete_file_hash(&tx, rel)?;
        tx.commit().map_err(crate::errors::DatabaseError::Sqlite)?;
        Ok(())
    }
}

/// The date-key component of every reference derived from a container.
///
/// Dailies key on the date, monthlies on the month, and collections on their
/// name, so moving a line between containers changes its reference.
fn container_date_key(container: &Container) -> String {
    match container {
        Container::Daily(d) => d.format(crate::constants::DATE_FORMAT_ISO).to_string(),
        Container::Monthly(m) => m.clone(),
        Container::Future => "future".to_string(),
        Container::IndexPage => "index".to_string(),
        Container::Collection(name) => name.clone(),
    }
}
