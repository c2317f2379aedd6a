//! Full-text search over the index.

use crate::db::{entries, Database};
use crate::db::entries::SearchHit;
use crate::errors::AppResult;
use tracing::debug;

/// Searches entry content, best matches first.
pub fn search(db: &Database, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
    let conn = db.get_conn()?;
    let hits = entries::search_entries(&conn, query, limit)?;
    debug!("Search '{}' returned {} hit(s)", query, hits.len());
    Ok(hits)
}
