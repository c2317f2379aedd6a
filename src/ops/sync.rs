//! Syncing the corpus between devices.

use crate::config::Config;
use crate::db::Database;
use crate::errors::{AppResult, SyncError};
use crate::index::ReindexReport;
use crate::ops::reindex::{reindex, ReindexMode};
use crate::sync::{sync_commit_message, SyncProvider};
use tracing::{info, warn};

/// Pulls remote changes, reindexes, and pushes local changes.
///
/// # Flow
///
/// 1. Pull from the remote
/// 2. If the pull left conflicts, stop: the index is not touched and the
///    user resolves the files by hand
/// 3. Incrementally reindex whatever changed
/// 4. Commit all local changes as `sync: <host> <timestamp>` and push
///
/// A failed push is only a warning: the commit stays local and the next
/// sync retries it.
///
/// # Errors
///
/// Returns `SyncError::Conflicts` with the conflicted file list when step 2
/// trips, and transport errors from the provider otherwise.
pub fn sync_corpus(
    db: &Database,
    config: &Config,
    provider: &dyn SyncProvider,
) -> AppResult<ReindexReport> {
    info!("Syncing corpus at {:?}", config.data_dir);
    provider.pull()?;

    let conflicts = provider.conflicted_files()?;
    if !conflicts.is_empty() {
        warn!("Sync left {} conflicted file(s)", conflicts.len());
        return Err(SyncError::Conflicts { files: conflicts }.into());
    }

    let report = reindex(db, config, ReindexMode::Incremental)?;

    provider.commit_all(&sync_commit_message(chrono::Local::now()))?;
    match provider.push() {
        Ok(()) => info!("Sync complete"),
        Err(e) => warn!("Push failed, changes remain committed locally: {}", e),
    }
    Ok(report)
}
