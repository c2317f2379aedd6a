//! Rebuilding or refreshing the index from the corpus.

use crate::config::Config;
use crate::db::Database;
use crate::errors::AppResult;
use crate::index::{Reindexer, ReindexReport};

/// Which kind of indexing pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexMode {
    /// Clear everything and rebuild from every file.
    Full,
    /// Touch only files whose content changed since the last pass.
    Incremental,
}

/// Runs an indexing pass over the corpus.
pub fn reindex(db: &Database, config: &Config, mode: ReindexMode) -> AppResult<ReindexReport> {
    let reindexer = Reindexer::new(db, &config.data_dir, &config.signifiers);
    match mode {
        ReindexMode::Full => reindexer.full_reindex(),
        ReindexMode::Incremental => reindexer.incremental_reindex(),
    }
}
