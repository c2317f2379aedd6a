//! Per-file content-hash records driving incremental reindexing.
//!
//! Each indexed file has one row mapping its corpus-relative path to the hash
//! of its bytes at indexing time. A file whose current hash matches its
//! recorded hash is skipped; a missing row means the file has never been
//! indexed; a row with no file on disk means the file was deleted.

use crate::errors::{AppResult, DatabaseError};
use rusqlite::Connection;

/// Gets the recorded content hash for a file, if any.
pub fn get_file_hash(conn: &Connection, file_path: &str) -> AppResult<Option<String>> {
    let result = conn.query_row(
        "SELECT content_hash FROM file_hashes WHERE file_path = ?1",
        [file_path],
        |row| row.get(0),
    );
    match result {
        Ok(hash) => Ok(Some(hash)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::Sqlite(e).into()),
    }
}

/// Records (or replaces) the content hash for a file.
pub fn set_file_hash(conn: &Connection, file_path: &str, content_hash: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO file_hashes (file_path, content_hash, indexed_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(file_path) DO UPDATE SET
            content_hash = excluded.content_hash,
            indexed_at = excluded.indexed_at",
        [file_path, content_hash],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Forgets the hash record for a file (deleted from the corpus).
pub fn delete_file_hash(conn: &Connection, file_path: &str) -> AppResult<()> {
    conn.execute("DELETE FROM file_hashes WHERE file_path = ?1", [file_path])
        .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Lists every file path currently recorded in the index.
pub fn all_indexed_files(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT file_path FROM file_hashes ORDER BY file_path")
        .map_err(DatabaseError::Sqlite)?;
    let files = stmt
        .query_map([], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(files)
}

/// Empties the file-hash table (full reindex start).
pub fn clear_all(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM file_hashes", [])
        .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize_schema().unwrap();
        db
    }

    #[test]
    fn test_set_and_get_hash() {
        let db = test_db();
        let conn = db.get_conn().unwrap();

        assert!(get_file_hash(&conn, "daily/2024-03-05.md").unwrap().is_none());

        set_file_hash(&conn, "daily/2024-03-05.md", "abc").unwrap();
        assert_eq!(
            get_file_hash(&conn, "daily/2024-03-05.md").unwrap().as_deref(),
            Some("abc")
        );

        // Upsert replaces in place.
        set_file_hash(&conn, "daily/2024-03-05.md", "def").unwrap();
        assert_eq!(
            get_file_hash(&conn, "daily/2024-03-05.md").unwrap().as_deref(),
            Some("def")
        );
        assert_eq!(all_indexed_files(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_hash() {
        let db = test_db();
        let conn = db.get_conn().unwrap();
        set_file_hash(&conn, "future.md", "abc").unwrap();
        delete_file_hash(&conn, "future.md").unwrap();
        assert!(get_file_hash(&conn, "future.md").unwrap().is_none());
    }

    #[test]
    fn test_all_indexed_files_sorted() {
        let db = test_db();
        let conn = db.get_conn().unwrap();
        set_file_hash(&conn, "months/2024-03.md", "a").unwrap();
        set_file_hash(&conn, "daily/2024-03-05.md", "b").unwrap();

        assert_eq!(
            all_indexed_files(&conn).unwrap(),
            vec!["daily/2024-03-05.md".to_string(), "months/2024-03.md".to_string()]
        );
    }
}
