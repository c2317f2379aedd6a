//! Stable entry reference generation.
//!
//! A reference is a pure function of `(source file, content, date key)`:
//! re-deriving it from unchanged inputs yields the same value on any device
//! with no shared state. References are blake3 hashes truncated to
//! [`REF_LEN`](crate::constants::REF_LEN) hex characters for human
//! typability; the index store enforces uniqueness explicitly because
//! truncation makes collisions possible in principle.
//!
//! Duplicate lines are the one systematic collision source: two identical
//! `[ ] buy milk` lines in the same daily file hash identically.
//! [`RefAllocator`] resolves this deterministically by folding the occurrence
//! index (nth identical line in the file, in line order) into the hash input,
//! so every device derives the same refs for the same file content.

use crate::constants::REF_LEN;
use std::collections::HashMap;

/// Computes the reference for an entry at a given occurrence index.
///
/// Occurrence 0 hashes `file:content:date_key`; occurrence n > 0 hashes
/// `file:content:date_key:n`.
pub fn entry_ref(source_file: &str, content: &str, date_key: &str, occurrence: usize) -> String {
    let input = if occurrence == 0 {
        format!("{}:{}:{}", source_file, content, date_key)
    } else {
        format!("{}:{}:{}:{}", source_file, content, date_key, occurrence)
    };
    let hash = blake3::hash(input.as_bytes());
    hash.to_hex().as_str()[..REF_LEN].to_string()
}

/// Assigns refs to the entries of one file, disambiguating duplicates.
///
/// One allocator is used per file per indexing pass; entries must be fed in
/// line order so occurrence numbering is deterministic.
#[derive(Debug, Default)]
pub struct RefAllocator {
    seen: HashMap<(String, String), usize>,
}

impl RefAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ref for the next occurrence of `(content, date_key)` in
    /// `source_file`.
    pub fn allocate(&mut self, source_file: &str, content: &str, date_key: &str) -> String {
        let occurrence = self
            .seen
            .entry((content.to_string(), date_key.to_string()))
            .and_modify(|n| *n += 1)
            .or_insert(0);
        entry_ref(source_file, content, date_key, *occurrence)
    }
}
