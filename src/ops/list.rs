//! Listing entries from the index.

use crate::db::{entries, Database};
use crate::db::entries::EntryFilter;
use crate::errors::AppResult;
use crate::model::EntryRecord;

/// Lists entries matching the filter, in file and line order.
pub fn list_entries(db: &Database, filter: &EntryFilter) -> AppResult<Vec<EntryRecord>> {
    let conn = db.get_conn()?;
    entries::list_entries(&conn, filter)
}
