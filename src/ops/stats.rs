//! Aggregate statistics over the index.

use crate::db::entries::IndexStats;
use crate::db::{entries, Database};
use crate::errors::AppResult;

/// Computes aggregate counts over the index, optionally narrowed to a year
/// (`"2024"`) or month (`"2024-03"`).
pub fn stats(db: &Database, month_scope: Option<&str>) -> AppResult<IndexStats> {
    let conn = db.get_conn()?;
    entries::collect_stats(&conn, month_scope)
}
