//! Error handling utilities for the bujo application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents specific error cases that can occur during database operations.
///
/// This enum provides detailed, contextual error information for different failure
/// modes when interacting with the SQLite index.
///
/// # Examples
///
/// ```
/// use bujo::errors::DatabaseError;
///
/// let error = DatabaseError::NotFound("a3f2c199".to_string());
/// assert!(format!("{}", error).contains("a3f2c199"));
/// ```
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite database error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("Failed to get connection from pool: {0}. Try closing other bujo instances.")]
    Pool(#[from] r2d2::Error),

    /// Requested entry reference not found in the index.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A reference prefix matched more than one entry.
    #[error("Reference prefix '{0}' is ambiguous; use more characters")]
    AmbiguousRef(String),

    /// Two distinct entries produced the same reference within one file.
    #[error("Reference collision for '{entry_ref}' in {file}; file left unindexed")]
    RefCollision {
        /// The colliding reference
        entry_ref: String,
        /// The file being indexed when the collision occurred
        file: String,
    },
}

/// Represents errors that can occur when acquiring the cross-process store lock.
///
/// The index is single-writer: a second concurrent invocation must fail fast
/// rather than block or corrupt state.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another bujo process holds the store lock.
    #[error("The index at {path} is in use by another bujo process. Wait for it to finish and retry.")]
    StoreBusy {
        /// The lock file path
        path: PathBuf,
    },

    /// The lock could not be acquired for a technical reason.
    #[error("Failed to acquire index lock at {path}: {source}")]
    AcquisitionFailed {
        /// The lock file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents failure modes of the migration engine.
///
/// Every variant implies the text files were left exactly as they were before
/// the operation began; the engine rolls back partial writes before returning.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The referenced entry is not a task.
    #[error("Entry {0} is not a task and cannot be migrated")]
    NotATask(String),

    /// The task is already complete, migrated, scheduled, or cancelled.
    #[error("Task {entry_ref} is already {status}")]
    AlreadyClosed {
        /// The task's reference
        entry_ref: String,
        /// Its current status
        status: String,
    },

    /// The destination string could not be understood.
    #[error("Invalid migration destination: {0} (expected monthly/YYYY-MM, future/YYYY-MM, future/someday, or collection/<name>)")]
    InvalidDestination(String),

    /// The named collection does not exist.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Writing the destination file failed; the source rewrite was rolled back.
    #[error("Failed to write migration destination {path}: {source}. Source file restored.")]
    DestinationUnwritable {
        /// The destination file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The entry's line could not be found at its recorded location.
    #[error("Source line {line} of {file} no longer matches the indexed entry; reindex and retry")]
    StaleSourceLine {
        /// The source file
        file: String,
        /// The recorded line number
        line: usize,
    },
}

/// Represents errors from the sync provider (git transport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The data directory is not a git repository.
    #[error("Not a git repository: {0}. Run 'git init' in the data directory first.")]
    NotARepository(PathBuf),

    /// A git subprocess could not be spawned.
    #[error("Failed to run git: {0}. Is git installed?")]
    GitUnavailable(#[source] io::Error),

    /// A git command exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        /// The git subcommand that failed
        command: String,
        /// Captured stderr
        stderr: String,
    },

    /// The pull left unresolved merge conflicts.
    #[error("Merge conflicts in {} file(s); resolve them and run sync again", files.len())]
    Conflicts {
        /// The conflicted files
        files: Vec<String>,
    },
}

/// Represents specific error cases that can occur when interacting with
/// external editors.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Error when the specified editor command cannot be found.
    #[error("Editor command '{command}' not found: {source}. Check that the editor is installed and on your PATH.")]
    CommandNotFound {
        /// The editor command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor command fails to execute.
    #[error("Failed to execute editor '{command}': {source}")]
    ExecutionFailed {
        /// The editor command that failed to execute
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor exits with a non-zero status code.
    #[error("Editor '{command}' exited with non-zero status code: {status_code}")]
    NonZeroExit {
        /// The editor command that exited with a non-zero status
        command: String,
        /// The exit status code
        status_code: i32,
    },
}

/// Represents all possible errors that can occur in the bujo application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error`
/// trait implementation and formatted error messages.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use bujo::errors::AppError;
///
/// let error = AppError::Config("invalid signifier table".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: invalid signifier table");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors in journal logic (bad dates, malformed locations).
    #[error("Journal error: {0}")]
    Journal(String),

    /// Errors related to database operations.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Errors related to the cross-process store lock.
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    /// Errors raised by the migration engine.
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Errors from the sync provider.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Errors when interacting with the text editor.
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected AppError::Io variant"),
        }
    }

    #[test]
    fn test_database_error_display() {
        let error = DatabaseError::NotFound("abc123".to_string());
        assert!(format!("{}", error).contains("abc123"));

        let error = DatabaseError::AmbiguousRef("a3".to_string());
        assert!(format!("{}", error).contains("ambiguous"));

        let error = DatabaseError::RefCollision {
            entry_ref: "deadbeef".to_string(),
            file: "daily/2024-01-01.md".to_string(),
        };
        let msg = format!("{}", error);
        assert!(msg.contains("deadbeef"));
        assert!(msg.contains("daily/2024-01-01.md"));
    }

    #[test]
    fn test_lock_error_display() {
        let error = LockError::StoreBusy {
            path: PathBuf::from("/tmp/.bujo.lock"),
        };
        let msg = format!("{}", error);
        assert!(msg.contains("another bujo process"));
        assert!(msg.contains("/tmp/.bujo.lock"));
    }

    #[test]
    fn test_migration_error_display() {
        let error = MigrationError::AlreadyClosed {
            entry_ref: "abc123".to_string(),
            status: "complete".to_string(),
        };
        let msg = format!("{}", error);
        assert!(msg.contains("abc123"));
        assert!(msg.contains("complete"));

        let error = MigrationError::InvalidDestination("nowhere".to_string());
        assert!(format!("{}", error).contains("nowhere"));
    }

    #[test]
    fn test_sync_error_conflict_count() {
        let error = SyncError::Conflicts {
            files: vec!["a.md".to_string(), "b.md".to_string()],
        };
        assert!(format!("{}", error).contains("2 file(s)"));
    }

    #[test]
    fn test_error_conversion_to_app_error() {
        let lock_error = LockError::StoreBusy {
            path: PathBuf::from("/tmp/.bujo.lock"),
        };
        let app_error: AppError = lock_error.into();
        match app_error {
            AppError::Lock(LockError::StoreBusy { path }) => {
                assert_eq!(path, PathBuf::from("/tmp/.bujo.lock"));
            }
            _ => panic!("Expected AppError::Lock variant"),
        }
    }
}
