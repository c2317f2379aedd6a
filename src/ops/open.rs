//! Opening journal files in the editor.

use crate::config::Config;
use crate::db::Database;
use crate::editor::Editor;
use crate::errors::AppResult;
use crate::index::Reindexer;
use crate::journal;
use chrono::NaiveDate;
use tracing::debug;

/// Opens a daily log in the editor, then reindexes it.
///
/// The file is created with its header if it does not exist yet, and the
/// reindex after the editor exits picks up whatever was written.
pub fn open_journal(
    db: &Database,
    config: &Config,
    editor: &dyn Editor,
    date: NaiveDate,
) -> AppResult<()> {
    let path = journal::create_daily_file(&config.data_dir, date)?;
    debug!("Opening {:?} in editor", path);
    editor.open_files(&[path.to_string_lossy().into_owned()])?;

    let reindexer = Reindexer::new(db, &config.data_dir, &config.signifiers);
    reindexer.reindex_file(&path)?;
    Ok(())
}
