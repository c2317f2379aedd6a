//! # Bujo - A Plain-Text Bullet Journal
//!
//! Bujo keeps a bullet journal as ordinary Markdown files and derives a
//! disposable SQLite index from them. The files are always the source of
//! truth: every structured view (listing, search, statistics, migration
//! history) is computed from the index, and the index can be deleted and
//! rebuilt from the text at any time.
//!
//! ## Architecture
//!
//! - [`parser`]: the line grammar turning Markdown lines into entries
//! - [`refs`]: deterministic, content-derived entry references
//! - [`journal`]: corpus layout and file I/O
//! - [`db`]: the SQLite index (entries, full-text search, file hashes)
//! - [`index`]: the reindexer deriving index state from the corpus
//! - [`ops`]: the user-facing operations behind each CLI command
//! - [`sync`]: the git transport moving the corpus between devices

pub mod cli;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod db;
pub mod editor;
pub mod errors;
pub mod index;
pub mod journal;
pub mod lock;
pub mod model;
pub mod ops;
pub mod parser;
pub mod refs;
pub mod sync;

pub use errors::{AppError, AppResult};
