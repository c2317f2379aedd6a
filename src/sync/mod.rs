//! Sync transport for the text corpus.
//!
//! The corpus travels between devices through an ordinary git repository in
//! the data directory. [`SyncProvider`] is the seam: the sync operation talks
//! to the trait so tests can substitute a mock, and [`GitSync`] implements it
//! by shelling out to the `git` binary.
//!
//! The index database is never synced; each device derives its own from the
//! files after pulling.

use crate::errors::{AppResult, SyncError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// Transport operations the sync flow needs.
pub trait SyncProvider {
    /// Fetches and integrates remote changes into the working tree.
    fn pull(&self) -> AppResult<()>;

    /// Lists files left with unresolved merge conflicts, relative paths.
    fn conflicted_files(&self) -> AppResult<Vec<String>>;

    /// Stages all changes and commits them with `message`. Committing with a
    /// clean tree is not an error.
    fn commit_all(&self, message: &str) -> AppResult<()>;

    /// Pushes local commits to the remote.
    fn push(&self) -> AppResult<()>;
}

/// Git-backed sync provider shelling out to the `git` binary.
#[derive(Debug)]
pub struct GitSync {
    repo_dir: PathBuf,
}

impl GitSync {
    /// Creates a provider for the repository at `repo_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotARepository`] when the directory has no `.git`.
    pub fn new(repo_dir: &Path) -> AppResult<Self> {
        if !repo_dir.join(".git").exists() {
            return Err(SyncError::NotARepository(repo_dir.to_path_buf()).into());
        }
        Ok(GitSync {
            repo_dir: repo_dir.to_path_buf(),
        })
    }

    fn run_git(&self, args: &[&str]) -> AppResult<Output> {
        debug!("Running git {:?} in {:?}", args, self.repo_dir);
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(SyncError::GitUnavailable)?;
        Ok(output)
    }

    fn run_git_checked(&self, args: &[&str]) -> AppResult<Output> {
        let output = self.run_git(args)?;
        if !output.status.success() {
            return Err(SyncError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(output)
    }
}

impl SyncProvider for GitSync {
    fn pull(&self) -> AppResult<()> {
        // A pull that stops on conflicts is not a hard failure; the caller
        // inspects conflicted_files() next.
        let output = self.run_git(&["pull", "--rebase=false", "--no-edit"])?;
        if !output.status.success() {
            let conflicts = self.conflicted_files()?;
            if !conflicts.is_empty() {
                return Ok(());
            }
            return Err(SyncError::CommandFailed {
                command: "pull".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn conflicted_files(&self) -> AppResult<Vec<String>> {
        let output = self.run_git_checked(&["diff", "--name-only", "--diff-filter=U"])?;
        let files = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .filter(|l| !l.is_empty())
            .collect();
        Ok(files)
    }

    fn commit_all(&self, message: &str) -> AppResult<()> {
        self.run_git_checked(&["add", "-A"])?;

        // Nothing staged means nothing to commit.
        let status = self.run_git_checked(&["status", "--porcelain"])?;
        if status.stdout.is_empty() {
            debug!("Working tree clean; skipping commit");
            return Ok(());
        }

        self.run_git_checked(&["commit", "-m", message])?;
        info!("Committed corpus changes: {}", message);
        Ok(())
    }

    fn push(&self) -> AppResult<()> {
        self.run_git_checked(&["push"])?;
        Ok(())
    }
}

/// Builds the standard sync commit message: `sync: <host> <timestamp>`.
pub fn sync_commit_message(now: chrono::DateTime<chrono::Local>) -> String {
    let host = hostname();
    format!("sync: {} {}", host, now.format("%Y-%m-%d %H:%M:%S"))
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            Command::new("hostname")
                .output()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        })
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_non_repository() {
        let dir = TempDir::new().unwrap();
        let err = GitSync::new(dir.path()).unwrap_err();
        match err {
            AppError::Sync(SyncError::NotARepository(path)) => assert_eq!(path, dir.path()),
            other => panic!("Expected NotARepository, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_commit_message_shape() {
        let now = chrono::Local::now();
        let msg = sync_commit_message(now);
        assert!(msg.starts_with("sync: "));
        assert!(msg.contains(&now.format("%Y-%m-%d").to_string()));
    }
}
