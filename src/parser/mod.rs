//! Line grammar for bullet journal entries.
//!
//! One line of text either parses into a [`ParsedEntry`] or it is prose and
//! yields `None`; skipping non-entry lines is the common case, not an error.
//! The grammar, applied left to right:
//!
//! 1. Trimmed-empty lines and heading lines (`#`...) are never entries.
//! 2. An optional signifier prefix: a configured symbol followed by
//!    whitespace. The signifier attaches only when a valid type marker
//!    follows; `* Just some text` is prose, not a signified note.
//! 3. Trailing migration hints (`→dest`, `←src`) are captured and stripped
//!    from the content.
//! 4. A type marker decides the entry kind: `[c]` for tasks (c is the status
//!    character), `○` for events, `- ` for notes.
//!
//! The parser is a pure function of the line and the signifier table; it is
//! re-parameterizable per invocation for testing with arbitrary tables.

use crate::config::SignifierTable;
use crate::constants::{EVENT_GLYPH, MIGRATED_FROM_MARKER, MIGRATED_TO_MARKER, NOTE_MARKER};
use crate::model::{EntryType, ParsedEntry, Signifier, TaskStatus};

/// Result of parsing a whole file's content.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Entries in line order.
    pub entries: Vec<ParsedEntry>,
    /// Count of non-empty, non-heading lines that did not match the grammar.
    pub prose_lines: usize,
}

/// Parses a single line into an entry, or `None` for prose.
///
/// `line_number` is 1-based and recorded on the entry as advisory location
/// information.
pub fn parse_line(line: &str, line_number: usize, signifiers: &SignifierTable) -> Option<ParsedEntry> {
    let raw_line = line;
    let mut rest = line.trim();

    // Headings and blank lines are structure, not entries.
    if rest.is_empty() || rest.starts_with('#') {
        return None;
    }

    // Tentatively take a signifier prefix; it only sticks if a type marker
    // follows (the strictness rule).
    let mut signifier: Option<Signifier> = None;
    let mut chars = rest.chars();
    if let (Some(first), Some(second)) = (chars.next(), chars.clone().next()) {
        if second.is_whitespace() {
            if let Some(meaning) = signifiers.get(first) {
                signifier = Some(meaning);
                rest = rest[first.len_utf8()..].trim_start();
            }
        }
    }

    // Strip trailing migration hints in either order.
    let (rest, migrated_to, migrated_from) = strip_migration_hints(rest);

    let (entry_type, status, content) = match_type_marker(rest)?;

    Some(ParsedEntry {
        entry_type,
        content: content.trim().to_string(),
        raw_line: raw_line.to_string(),
        line_number,
        status,
        signifier,
        migrated_to,
        migrated_from,
    })
}

/// Parses every line of `content`, collecting entries and counting prose.
pub fn parse_content(content: &str, signifiers: &SignifierTable) -> ParsedFile {
    let mut parsed = ParsedFile::default();
    for (idx, line) in content.lines().enumerate() {
        match parse_line(line, idx + 1, signifiers) {
            Some(entry) => parsed.entries.push(entry),
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    parsed.prose_lines += 1;
                }
            }
        }
    }
    parsed
}

/// Splits trailing `→dest` / `←src` hint tokens off a line.
fn strip_migration_hints(line: &str) -> (&str, Option<String>, Option<String>) {
    let mut rest = line.trim_end();
    let mut migrated_to = None;
    let mut migrated_from = None;

    // At most one of each; they may appear in either order at the end.
    for _ in 0..2 {
        let Some(last) = rest.rsplit(char::is_whitespace).next() else {
            break;
        };
        if last.len() <= last.chars().next().map_or(0, char::len_utf8) {
            break; // a bare arrow with no location is content, not a hint
        }
        if migrated_to.is_none() && last.starts_with(MIGRATED_TO_MARKER) {
            migrated_to = Some(last[MIGRATED_TO_MARKER.len_utf8()..].to_string());
        } else if migrated_from.is_none() && last.starts_with(MIGRATED_FROM_MARKER) {
            migrated_from = Some(last[MIGRATED_FROM_MARKER.len_utf8()..].to_string());
        } else {
            break;
        }
        rest = rest[..rest.len() - last.len()].trim_end();
    }

    (rest, migrated_to, migrated_from)
}

/// Matches the entry-type marker at the start of `line`.
///
/// Priority order is task, event, note; anything else is prose.
fn match_type_marker(line: &str) -> Option<(EntryType, Option<TaskStatus>, &str)> {
    // Task: `[c]` followed by whitespace and content.
    if let Some(inner) = line.strip_prefix('[') {
        let mut it = inner.chars();
        if let (Some(status_char), Some(']')) = (it.next(), it.next()) {
            if let Some(status) = TaskStatus::from_marker_char(status_char) {
                let after = &inner[status_char.len_utf8() + 1..];
                let content = after.strip_prefix(|c: char| c.is_whitespace())?;
                if content.trim().is_empty() {
                    return None;
                }
                return Some((EntryType::Task, Some(status), content));
            }
        }
        return None;
    }

    // Event: glyph, optional whitespace, content.
    if let Some(after) = line.strip_prefix(EVENT_GLYPH) {
        let content = after.trim_start();
        if content.is_empty() {
            return None;
        }
        return Some((EntryType::Event, None, content));
    }

    // Note: `-` followed by whitespace and content.
    if let Some(after) = line.strip_prefix(NOTE_MARKER) {
        let content = after.strip_prefix(|c: char| c.is_whitespace())?;
        if content.trim().is_empty() {
            return None;
        }
        return Some((EntryType::Note, None, content));
    }

    None
}

/// Rewrites the status character of a task line in place.
///
/// Everything outside the brackets is preserved byte-for-byte. Lines without
/// a task marker are returned unchanged.
pub fn update_task_status(line: &str, new_status: TaskStatus) -> String {
    if let Some(open) = line.find('[') {
        let inner = &line[open + 1..];
        let mut it = inner.chars();
        if let (Some(status_char), Some(']')) = (it.next(), it.next()) {
            if TaskStatus::from_marker_char(status_char).is_some() {
                let mut out = String::with_capacity(line.len());
                out.push_str(&line[..open + 1]);
                out.push(new_status.marker_char());
                out.push_str(&inner[status_char.len_utf8()..]);
                return out;
            }
        }
    }
    line.to_string()
}

/// Appends a `→destination` hint to a line, replacing any existing one.
pub fn add_migration_hint(line: &str, destination: &str) -> String {
    let mut rest = line.trim_end();
    if let Some(last) = rest.rsplit(char::is_whitespace).next() {
        if last.starts_with(MIGRATED_TO_MARKER) && last.chars().count() > 1 {
            rest = rest[..rest.len() - last.len()].trim_end();
        }
    }
    format!("{} {}{}", rest, MIGRATED_TO_MARKER, destination)
}

/// Builds the destination line for a migrated task: an open task carrying the
/// original content and a back-pointer to the source location.
pub fn render_migrated_entry(
    content: &str,
    source: &str,
    signifier: Option<Signifier>,
    signifiers: &SignifierTable,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(c) = signifier.and_then(|s| signifiers.symbol_for(s)) {
        parts.push(c.to_string());
    }
    parts.push("[ ]".to_string());
    parts.push(content.to_string());
    parts.push(format!("{}{}", MIGRATED_FROM_MARKER, source));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SignifierTable {
        SignifierTable::default_table()
    }

    #[test]
    fn test_parse_open_task() {
        let entry = parse_line("[ ] Call the bank", 1, &table()).unwrap();
        assert_eq!(entry.entry_type, EntryType::Task);
        assert_eq!(entry.status, Some(TaskStatus::Open));
        assert_eq!(entry.content, "Call the bank");
        assert_eq!(entry.signifier, None);
        assert_eq!(entry.raw_line, "[ ] Call the bank");
        assert_eq!(entry.line_number, 1);
    }

    #[test]
    fn test_parse_all_task_statuses() {
        let cases = [
            ("[ ] open it", TaskStatus::Open),
            ("[x] did it", TaskStatus::Complete),
            ("[>] moved it", TaskStatus::Migrated),
            ("[<] later", TaskStatus::Scheduled),
            ("[~] dropped", TaskStatus::Cancelled),
        ];
        for (line, status) in cases {
            let entry = parse_line(line, 1, &table()).unwrap();
            assert_eq!(entry.status, Some(status), "line: {line}");
        }
    }

    #[test]
    fn test_parse_signified_task() {
        let entry = parse_line("* [ ] Call the bank", 1, &table()).unwrap();
        assert_eq!(entry.signifier, Some(Signifier::Priority));
        assert_eq!(entry.status, Some(TaskStatus::Open));
        assert_eq!(entry.content, "Call the bank");
    }

    #[test]
    fn test_signifier_without_marker_is_prose() {
        // The strictness rule: a bare signifier char followed by plain text
        // must not produce an entry.
        assert!(parse_line("* Just some text", 1, &table()).is_none());
        assert!(parse_line("! neither is this", 1, &table()).is_none());
    }

    #[test]
    fn test_parse_event_and_note() {
        let event = parse_line("○ Dentist at 3pm", 1, &table()).unwrap();
        assert_eq!(event.entry_type, EntryType::Event);
        assert_eq!(event.content, "Dentist at 3pm");

        // Event glyph tolerates missing whitespace.
        let tight = parse_line("○Dentist", 1, &table()).unwrap();
        assert_eq!(tight.content, "Dentist");

        let note = parse_line("- A passing thought", 1, &table()).unwrap();
        assert_eq!(note.entry_type, EntryType::Note);
        assert_eq!(note.content, "A passing thought");
    }

    #[test]
    fn test_note_requires_whitespace() {
        // `-dashed-word` is prose, not a note.
        assert!(parse_line("-dashed-word", 1, &table()).is_none());
    }

    #[test]
    fn test_headers_blank_and_prose_skipped() {
        assert!(parse_line("# March 05, 2024", 1, &table()).is_none());
        assert!(parse_line("## Tasks", 1, &table()).is_none());
        assert!(parse_line("", 1, &table()).is_none());
        assert!(parse_line("   ", 1, &table()).is_none());
        assert!(parse_line("ordinary prose line", 1, &table()).is_none());
        assert!(parse_line("[?] unknown status", 1, &table()).is_none());
    }

    #[test]
    fn test_parse_migration_hints() {
        let entry = parse_line("[>] Call the bank →months/2024-02.md", 1, &table()).unwrap();
        assert_eq!(entry.status, Some(TaskStatus::Migrated));
        assert_eq!(entry.content, "Call the bank");
        assert_eq!(entry.migrated_to.as_deref(), Some("months/2024-02.md"));
        assert_eq!(entry.migrated_from, None);

        let entry = parse_line("[ ] Call the bank ←daily/2024-01-31.md", 1, &table()).unwrap();
        assert_eq!(entry.migrated_from.as_deref(), Some("daily/2024-01-31.md"));
        assert_eq!(entry.content, "Call the bank");
    }

    #[test]
    fn test_parse_both_hints_either_order() {
        let entry = parse_line("[>] Relay task →b.md ←a.md", 1, &table()).unwrap();
        assert_eq!(entry.migrated_to.as_deref(), Some("b.md"));
        assert_eq!(entry.migrated_from.as_deref(), Some("a.md"));
        assert_eq!(entry.content, "Relay task");

        let entry = parse_line("[>] Relay task ←a.md →b.md", 1, &table()).unwrap();
        assert_eq!(entry.migrated_to.as_deref(), Some("b.md"));
        assert_eq!(entry.migrated_from.as_deref(), Some("a.md"));
    }

    #[test]
    fn test_bare_arrow_stays_in_content() {
        let entry = parse_line("- weather was nice →", 1, &table()).unwrap();
        assert_eq!(entry.content, "weather was nice →");
        assert_eq!(entry.migrated_to, None);
    }

    #[test]
    fn test_unicode_content() {
        let entry = parse_line("[ ] 銀行に電話する 📞", 1, &table()).unwrap();
        assert_eq!(entry.content, "銀行に電話する 📞");

        let entry = parse_line("* [x] finir le café ☕", 1, &table()).unwrap();
        assert_eq!(entry.signifier, Some(Signifier::Priority));
        assert_eq!(entry.content, "finir le café ☕");
    }

    #[test]
    fn test_long_content_not_truncated() {
        let long = "x".repeat(10_000);
        let entry = parse_line(&format!("[ ] {long}"), 1, &table()).unwrap();
        assert_eq!(entry.content.len(), 10_000);
    }

    #[test]
    fn test_custom_signifier_table() {
        let custom = SignifierTable::from_pairs(vec![('@', Signifier::Waiting)]).unwrap();
        let entry = parse_line("@ [ ] hear back from Sam", 1, &custom).unwrap();
        assert_eq!(entry.signifier, Some(Signifier::Waiting));

        // `*` means nothing under the custom table, so the line is prose:
        // `* [ ] ...` begins with an unknown symbol, not a type marker.
        assert!(parse_line("* [ ] task", 1, &custom).is_none());
    }

    #[test]
    fn test_parse_content_counts_prose() {
        let content = "# Header\n\n[ ] a task\nsome prose\n- a note\nmore prose\n";
        let parsed = parse_content(content, &table());
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.prose_lines, 2);
        assert_eq!(parsed.entries[0].line_number, 3);
        assert_eq!(parsed.entries[1].line_number, 5);
    }

    #[test]
    fn test_round_trip_via_render() {
        let sigs = table();
        let lines = [
            "* [ ] Call the bank",
            "[x] Taxes",
            "○ Standup",
            "- Remember the milk",
            "[>] Old task →months/2024-02.md",
            "[ ] Carried task ←daily/2024-01-31.md",
        ];
        for line in lines {
            let entry = parse_line(line, 1, &sigs).unwrap();
            let rendered = entry.to_markdown(|s| sigs.symbol_for(s));
            assert_eq!(rendered, line);
            let reparsed = parse_line(&rendered, 1, &sigs).unwrap();
            assert_eq!(reparsed.content, entry.content);
            assert_eq!(reparsed.entry_type, entry.entry_type);
            assert_eq!(reparsed.status, entry.status);
            assert_eq!(reparsed.signifier, entry.signifier);
            assert_eq!(reparsed.migrated_to, entry.migrated_to);
            assert_eq!(reparsed.migrated_from, entry.migrated_from);
        }
    }

    #[test]
    fn test_update_task_status_preserves_line() {
        let line = "* [ ] Call the bank →months/2024-02.md";
        let updated = update_task_status(line, TaskStatus::Migrated);
        assert_eq!(updated, "* [>] Call the bank →months/2024-02.md");

        // Untouched when no marker exists.
        assert_eq!(update_task_status("- a note", TaskStatus::Complete), "- a note");
    }

    #[test]
    fn test_add_migration_hint_replaces_existing() {
        assert_eq!(
            add_migration_hint("[>] Call the bank", "months/2024-02.md"),
            "[>] Call the bank →months/2024-02.md"
        );
        assert_eq!(
            add_migration_hint("[>] Call the bank →old.md", "months/2024-03.md"),
            "[>] Call the bank →months/2024-03.md"
        );
    }

    #[test]
    fn test_render_migrated_entry() {
        let sigs = table();
        assert_eq!(
            render_migrated_entry("Call the bank", "daily/2024-01-31.md", None, &sigs),
            "[ ] Call the bank ←daily/2024-01-31.md"
        );
        assert_eq!(
            render_migrated_entry(
                "Call the bank",
                "daily/2024-01-31.md",
                Some(Signifier::Priority),
                &sigs
            ),
            "* [ ] Call the bank ←daily/2024-01-31.md"
        );
    }
}
