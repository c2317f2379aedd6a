//! Editor abstraction for opening journal files.
//!
//! This module provides an abstraction for opening files in an external
//! editor, allowing the application to work with different editors and to be
//! testable by mocking the editor functionality.

use crate::errors::{AppResult, EditorError};
use std::io;
use std::process::Command;

/// Trait defining the interface for an editor component.
///
/// Abstracts opening files in an editor so the open operation can run against
/// a real system editor or a mock in tests.
pub trait Editor {
    /// Opens one or more files in the editor, blocking until it exits.
    ///
    /// # Errors
    ///
    /// Different implementations may return different errors when file
    /// opening fails.
    fn open_files(&self, paths: &[String]) -> AppResult<()>;
}

/// An implementation of the Editor trait that launches a system command.
pub struct SystemEditor {
    /// The command to use for opening files (e.g., "vim", "code", "nano").
    pub editor_cmd: String,
}

impl Editor for SystemEditor {
    /// Opens the specified files with the configured editor command.
    ///
    /// If the list of paths is empty, returns immediately with Ok(()).
    ///
    /// # Errors
    ///
    /// Returns `EditorError::CommandNotFound` when the command does not
    /// exist, `EditorError::ExecutionFailed` when it cannot be spawned, and
    /// `EditorError::NonZeroExit` when the editor exits unsuccessfully.
    fn open_files(&self, paths: &[String]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let status = Command::new(&self.editor_cmd)
            .args(paths)
            .status()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    EditorError::CommandNotFound {
                        command: self.editor_cmd.clone(),
                        source,
                    }
                } else {
                    EditorError::ExecutionFailed {
                        command: self.editor_cmd.clone(),
                        source,
                    }
                }
            })?;

        if !status.success() {
            return Err(EditorError::NonZeroExit {
                command: self.editor_cmd.clone(),
                status_code: status.code().unwrap_or(-1),
            }
            .into());
        }

        Ok(())
    }
}
