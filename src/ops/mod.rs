//! High-level operations behind the CLI commands.
//!
//! Each operation orchestrates the lower layers: locate or rewrite lines in
//! the text corpus, then refresh the affected files in the index so the two
//! never drift. The files are the source of truth throughout; no operation
//! writes index state it could not rebuild from the corpus.

pub mod add;
pub mod done;
pub mod history;
pub mod list;
pub mod migrate;
pub mod open;
pub mod reindex;
pub mod search;
pub mod stats;
pub mod sync;

pub use add::add_entry;
pub use done::complete_task;
pub use history::task_history;
pub use list::list_entries;
pub use migrate::{migrate_task, schedule_task, Destination};
pub use open::open_journal;
pub use reindex::{reindex, ReindexMode};
pub use search::search;
pub use stats::stats;
pub use sync::sync_corpus;
