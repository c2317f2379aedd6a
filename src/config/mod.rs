//! Configuration loading and management for the bujo application.
//!
//! Configuration comes from environment variables with sensible defaults:
//!
//! - `BUJO_DIR`: Root directory for journal data (defaults to `~/.bujo`).
//!   Markdown files live under `<root>/data`, the disposable index at
//!   `<root>/cache.db`.
//! - `BUJO_EDITOR` / `EDITOR`: Editor command for `bujo open` (defaults to "vim").
//! - `BUJO_SIGNIFIERS`: Extra signifier symbols as comma-separated
//!   `char=meaning` pairs, merged over the defaults (`*`=priority,
//!   `!`=inspiration, `?`=explore). Recognized meanings: priority,
//!   inspiration, explore, waiting, delegated.
//!
//! The signifier table is built and validated once at startup and passed into
//! the parser as a parameter; nothing here is process-global state.

use crate::constants::{
    CACHE_DB_FILE, DEFAULT_BUJO_SUBDIR, DEFAULT_EDITOR_COMMAND, EDITOR_FORBIDDEN_CHARS,
    ENV_VAR_BUJO_DIR, ENV_VAR_BUJO_EDITOR, ENV_VAR_BUJO_SIGNIFIERS, ENV_VAR_EDITOR, LOCK_FILE,
};
use crate::errors::{AppError, AppResult};
use crate::model::Signifier;
use std::env;
use std::path::PathBuf;

/// Mapping from leading symbol characters to signifier meanings.
///
/// The parser consults this table when deciding whether the first character
/// of a line is a signifier. It is an explicit value threaded through call
/// sites so tests can parse with arbitrary tables.
#[derive(Debug, Clone)]
pub struct SignifierTable {
    entries: Vec<(char, Signifier)>,
}

impl SignifierTable {
    /// The default table: `*`=priority, `!`=inspiration, `?`=explore.
    pub fn default_table() -> Self {
        SignifierTable {
            entries: vec![
                ('*', Signifier::Priority),
                ('!', Signifier::Inspiration),
                ('?', Signifier::Explore),
            ],
        }
    }

    /// An empty table (no line is treated as signified). Useful in tests.
    pub fn empty() -> Self {
        SignifierTable { entries: Vec::new() }
    }

    /// Builds a table from `(symbol, meaning)` pairs, validating each symbol.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a symbol is alphanumeric, whitespace, or
    /// one of the characters the line grammar already claims (`[`, `#`, the
    /// event glyph, the migration arrows), or if the same symbol appears twice.
    pub fn from_pairs(pairs: Vec<(char, Signifier)>) -> AppResult<Self> {
        let mut table = SignifierTable { entries: Vec::new() };
        for (symbol, meaning) in pairs {
            table.insert(symbol, meaning)?;
        }
        Ok(table)
    }

    /// Adds or rejects one symbol mapping.
    pub fn insert(&mut self, symbol: char, meaning: Signifier) -> AppResult<()> {
        const RESERVED: &[char] = &[
            '[',
            '#',
            crate::constants::EVENT_GLYPH,
            crate::constants::NOTE_MARKER,
            crate::constants::MIGRATED_TO_MARKER,
            crate::constants::MIGRATED_FROM_MARKER,
        ];
        if symbol.is_alphanumeric() || symbol.is_whitespace() || RESERVED.contains(&symbol) {
            return Err(AppError::Config(format!(
                "invalid signifier symbol '{}' (must be punctuation not used by the line grammar)",
                symbol
            )));
        }
        if self.entries.iter().any(|(c, _)| *c == symbol) {
            return Err(AppError::Config(format!(
                "duplicate signifier symbol '{}'",
                symbol
            )));
        }
        self.entries.push((symbol, meaning));
        Ok(())
    }

    /// Looks up the meaning of a symbol.
    pub fn get(&self, symbol: char) -> Option<Signifier> {
        self.entries
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|(_, s)| *s)
    }

    /// Looks up the symbol rendering a meaning (for writing lines back out).
    pub fn symbol_for(&self, meaning: Signifier) -> Option<char> {
        self.entries
            .iter()
            .find(|(_, s)| *s == meaning)
            .map(|(c, _)| *c)
    }

    /// True when the table holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration for the bujo application.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory (`BUJO_DIR` or `~/.bujo`).
    pub bujo_dir: PathBuf,
    /// Directory holding the Markdown corpus (`<root>/data`).
    pub data_dir: PathBuf,
    /// Path of the disposable SQLite index (`<root>/cache.db`).
    pub cache_db: PathBuf,
    /// Path of the cross-process lock file (`<root>/.bujo.lock`).
    pub lock_file: PathBuf,
    /// Editor command for `bujo open`.
    pub editor: String,
    /// Validated symbol-to-meaning mapping for the parser.
    pub signifiers: SignifierTable,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `BUJO_SIGNIFIERS` is malformed or the
    /// home directory cannot be determined for the default root.
    pub fn load() -> AppResult<Self> {
        let bujo_dir = match env::var(ENV_VAR_BUJO_DIR) {
            Ok(dir) if !dir.is_empty() => {
                PathBuf::from(shellexpand::tilde(&dir).into_owned())
            }
            _ => {
                let home = env::var("HOME").map_err(|_| {
                    AppError::Config("HOME is not set and BUJO_DIR was not provided".to_string())
                })?;
                PathBuf::from(home).join(DEFAULT_BUJO_SUBDIR)
            }
        };

        let editor = env::var(ENV_VAR_BUJO_EDITOR)
            .or_else(|_| env::var(ENV_VAR_EDITOR))
            .unwrap_or_else(|_| DEFAULT_EDITOR_COMMAND.to_string());

        let mut signifiers = SignifierTable::default_table();
        if let Ok(spec) = env::var(ENV_VAR_BUJO_SIGNIFIERS) {
            merge_signifier_spec(&mut signifiers, &spec)?;
        }

        Ok(Config {
            data_dir: bujo_dir.join("data"),
            cache_db: bujo_dir.join(CACHE_DB_FILE),
            lock_file: bujo_dir.join(LOCK_FILE),
            bujo_dir,
            editor,
            signifiers,
        })
    }

    /// Validates the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the root path is relative or the editor
    /// command is empty or contains shell metacharacters.
    pub fn validate(&self) -> AppResult<()> {
        if !self.bujo_dir.is_absolute() {
            return Err(AppError::Config(format!(
                "bujo directory must be an absolute path: {}",
                self.bujo_dir.display()
            )));
        }
        validate_editor_command(&self.editor)?;
        Ok(())
    }
}

/// Checks an editor command for emptiness and shell metacharacters.
pub fn validate_editor_command(editor: &str) -> AppResult<()> {
    if editor.trim().is_empty() {
        return Err(AppError::Config("editor command is empty".to_string()));
    }
    if editor.chars().any(|c| EDITOR_FORBIDDEN_CHARS.contains(&c)) {
        return Err(AppError::Config(format!(
            "editor command contains forbidden characters: {}",
            editor
        )));
    }
    Ok(())
}

/// Merges a `char=meaning,char=meaning` spec string into a table.
fn merge_signifier_spec(table: &mut SignifierTable, spec: &str) -> AppResult<()> {
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (sym, name) = pair.split_once('=').ok_or_else(|| {
            AppError::Config(format!("malformed signifier pair '{}' (expected char=meaning)", pair))
        })?;
        let mut chars = sym.trim().chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(AppError::Config(format!(
                    "signifier symbol must be a single character: '{}'",
                    sym
                )))
            }
        };
        let meaning = Signifier::from_str_opt(name.trim()).ok_or_else(|| {
            AppError::Config(format!("unknown signifier meaning '{}'", name.trim()))
        })?;
        table.insert(symbol, meaning)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_lookup() {
        let table = SignifierTable::default_table();
        assert_eq!(table.get('*'), Some(Signifier::Priority));
        assert_eq!(table.get('!'), Some(Signifier::Inspiration));
        assert_eq!(table.get('?'), Some(Signifier::Explore));
        assert_eq!(table.get('@'), None);
        assert_eq!(table.symbol_for(Signifier::Priority), Some('*'));
        assert_eq!(table.symbol_for(Signifier::Waiting), None);
    }

    #[test]
    fn test_insert_rejects_reserved_symbols() {
        let mut table = SignifierTable::empty();
        assert!(table.insert('[', Signifier::Priority).is_err());
        assert!(table.insert('#', Signifier::Priority).is_err());
        assert!(table.insert('-', Signifier::Priority).is_err());
        assert!(table.insert('a', Signifier::Priority).is_err());
        assert!(table.insert(' ', Signifier::Priority).is_err());
        assert!(table.insert('@', Signifier::Waiting).is_ok());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut table = SignifierTable::default_table();
        assert!(table.insert('*', Signifier::Waiting).is_err());
    }

    #[test]
    fn test_merge_signifier_spec() {
        let mut table = SignifierTable::default_table();
        merge_signifier_spec(&mut table, "@=waiting, &=delegated").unwrap();
        assert_eq!(table.get('@'), Some(Signifier::Waiting));
        assert_eq!(table.get('&'), Some(Signifier::Delegated));
    }

    #[test]
    fn test_merge_signifier_spec_rejects_garbage() {
        let mut table = SignifierTable::default_table();
        assert!(merge_signifier_spec(&mut table, "waiting").is_err());
        assert!(merge_signifier_spec(&mut table, "@=urgent").is_err());
        assert!(merge_signifier_spec(&mut table, "ab=waiting").is_err());
    }

    #[test]
    fn test_validate_editor_command() {
        assert!(validate_editor_command("vim").is_ok());
        assert!(validate_editor_command("").is_err());
        assert!(validate_editor_command("vim; rm -rf /").is_err());
        assert!(validate_editor_command("vim`id`").is_err());
    }
}
