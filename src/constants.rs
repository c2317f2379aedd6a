//! Constants used throughout the application.
//!
//! This module contains all constants used in the bujo application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "bujo";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A plain-text bullet journal with a fast local index";

// Configuration Keys & Environment Variables
/// Environment variable for specifying the bujo data directory.
pub const ENV_VAR_BUJO_DIR: &str = "BUJO_DIR";
/// Environment variable for specifying the preferred editor.
pub const ENV_VAR_BUJO_EDITOR: &str = "BUJO_EDITOR";
/// Standard environment variable for specifying the default editor.
pub const ENV_VAR_EDITOR: &str = "EDITOR";
/// Environment variable for extending the signifier table
/// (comma-separated `char=meaning` pairs, e.g. `@=waiting,&=delegated`).
pub const ENV_VAR_BUJO_SIGNIFIERS: &str = "BUJO_SIGNIFIERS";
/// Default directory for journal data within the user's home directory.
pub const DEFAULT_BUJO_SUBDIR: &str = ".bujo";
/// Default command for the editor if not specified otherwise.
pub const DEFAULT_EDITOR_COMMAND: &str = "vim";

// Validation
/// Characters forbidden in editor commands for security reasons.
pub const EDITOR_FORBIDDEN_CHARS: &[char] =
    &['|', '&', ';', '$', '(', ')', '`', '\\', '<', '>', '\'', '"'];

// Corpus layout
/// Sub-directory holding daily log files (`YYYY-MM-DD.md`).
pub const DAILY_DIR: &str = "daily";
/// Sub-directory holding monthly log files (`YYYY-MM.md`).
pub const MONTHS_DIR: &str = "months";
/// Sub-directory holding collection files.
pub const COLLECTIONS_DIR: &str = "collections";
/// File name of the future log.
pub const FUTURE_FILE: &str = "future.md";
/// File name of the index page.
pub const INDEX_FILE: &str = "index.md";
/// File extension for journal files.
pub const JOURNAL_FILE_EXTENSION: &str = "md";
/// Database file name, stored beside the data directory.
pub const CACHE_DB_FILE: &str = "cache.db";
/// Lock file guarding the database against concurrent invocations.
pub const LOCK_FILE: &str = ".bujo.lock";

// Line grammar markers
/// Glyph introducing an event entry.
pub const EVENT_GLYPH: char = '○';
/// Marker introducing a note entry.
pub const NOTE_MARKER: char = '-';
/// Marker prefixing a migration destination hint.
pub const MIGRATED_TO_MARKER: char = '→';
/// Marker prefixing a migration source hint.
pub const MIGRATED_FROM_MARKER: char = '←';

// Reference generation
/// Number of hex characters in a displayed entry reference.
pub const REF_LEN: usize = 8;

// Migration
/// Upper bound on migration-chain traversal before the chain is flagged.
pub const MAX_MIGRATION_HOPS: usize = 32;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Format of the month key (YYYY-MM).
pub const MONTH_FORMAT: &str = "%Y-%m";
/// Date format used in daily file headers.
pub const DAILY_HEADER_DATE_FORMAT: &str = "%B %d, %Y";
