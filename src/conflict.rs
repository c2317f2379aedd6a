//! Detection of unresolved merge-conflict markers.
//!
//! Files are exchanged between devices through a version-control transport,
//! and a failed automatic merge leaves textual conflict markers behind.
//! Indexing such a file would ingest duplicated content from both sides of
//! the conflict, so the reindexer consults this guard first and skips
//! conflicted files, leaving their previously indexed entries untouched.

/// Returns true when `content` contains unresolved merge-conflict markers.
///
/// A line starting with `<<<<<<< ` or `>>>>>>> ` (or `|||||||` from diff3
/// output) is taken as conclusive. A bare `=======` line counts only after an
/// opening marker has been seen, since a line of equals signs is also a
/// common Markdown underline.
pub fn has_conflict_markers(content: &str) -> bool {
    let mut in_conflict = false;
    for line in content.lines() {
        if line.starts_with("<<<<<<< ") {
            return true;
        }
        if line.starts_with(">>>>>>> ") || line.starts_with("|||||||") {
            return true;
        }
        if in_conflict && line == "=======" {
            return true;
        }
        if line.starts_with("<<<<<<<") {
            in_conflict = true;
        }
    }
    false
}
