//! Journal corpus layout and file I/O.
//!
//! The text corpus is plain Markdown under the data directory:
//!
//! ```text
//! data/
//!   daily/YYYY-MM-DD.md      one file per day
//!   months/YYYY-MM.md        monthly logs with a calendar scaffold
//!   future.md                the future log
//!   index.md                 the index page
//!   collections/<type>/<name>.md
//! ```
//!
//! Everything here treats files as the source of truth; the index is derived.
//! Paths stored in the index are always relative to the data directory with
//! forward slashes, so refs agree across devices.

use crate::constants::{
    COLLECTIONS_DIR, DAILY_DIR, DAILY_HEADER_DATE_FORMAT, DATE_FORMAT_ISO, FUTURE_FILE,
    INDEX_FILE, JOURNAL_FILE_EXTENSION, MONTHS_DIR,
};
use crate::errors::{AppError, AppResult};
use crate::model::Container;
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensures the data directory and its standard subdirectories exist.
pub fn ensure_data_dirs(data_dir: &Path) -> AppResult<()> {
    for dir in [
        data_dir.to_path_buf(),
        data_dir.join(DAILY_DIR),
        data_dir.join(MONTHS_DIR),
        data_dir.join(COLLECTIONS_DIR),
    ] {
        fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Path of the daily log for a date.
pub fn daily_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir
        .join(DAILY_DIR)
        .join(format!("{}.{}", date.format(DATE_FORMAT_ISO), JOURNAL_FILE_EXTENSION))
}

/// Path of the monthly log for a year and month.
pub fn monthly_path(data_dir: &Path, year: i32, month: u32) -> PathBuf {
    data_dir
        .join(MONTHS_DIR)
        .join(format!("{:04}-{:02}.{}", year, month, JOURNAL_FILE_EXTENSION))
}

/// Path of the future log.
pub fn future_path(data_dir: &Path) -> PathBuf {
    data_dir.join(FUTURE_FILE)
}

/// Path of a collection file. Names may carry a type prefix
/// (`projects/garden`) selecting a subdirectory.
pub fn collection_path(data_dir: &Path, name: &str) -> PathBuf {
    let mut path = data_dir.join(COLLECTIONS_DIR);
    for part in name.split('/') {
        path = path.join(part);
    }
    path.set_extension(JOURNAL_FILE_EXTENSION);
    path
}

/// Normalizes a corpus file path to its index key: relative to the data
/// directory, forward slashes.
pub fn relative_path(data_dir: &Path, file_path: &Path) -> String {
    let rel = file_path.strip_prefix(data_dir).unwrap_or(file_path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Determines which logical container a corpus file belongs to.
///
/// `rel_path` is the normalized relative path. Files that match no known
/// layout are treated as loose collections named after the file stem, so a
/// stray Markdown file still indexes somewhere sensible.
pub fn determine_container(rel_path: &str) -> Container {
    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);

    if let Some(rest) = rel_path.strip_prefix("daily/") {
        if !rest.contains('/') {
            if let Ok(date) = NaiveDate::parse_from_str(stem, DATE_FORMAT_ISO) {
                return Container::Daily(date);
            }
        }
    }

    if let Some(rest) = rel_path.strip_prefix("months/") {
        if !rest.contains('/') && is_month_key(stem) {
            return Container::Monthly(stem.to_string());
        }
    }

    if rel_path == FUTURE_FILE {
        return Container::Future;
    }
    if rel_path == INDEX_FILE {
        return Container::IndexPage;
    }

    if let Some(rest) = rel_path.strip_prefix("collections/") {
        let name = rest.strip_suffix(".md").unwrap_or(rest);
        return Container::Collection(name.to_string());
    }

    Container::Collection(stem.to_string())
}

fn is_month_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..].iter().all(|b| b.is_ascii_digit())
}

/// Walks all Markdown files under the data directory, in path order.
pub fn walk_markdown_files(data_dir: &Path) -> Vec<PathBuf> {
    if !data_dir.exists() {
        return Vec::new();
    }
    WalkDir::new(data_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == JOURNAL_FILE_EXTENSION)
        })
        .map(|e| e.into_path())
        .collect()
}

/// Reads a file as lines without trailing newlines. Missing file reads empty.
pub fn read_lines(file_path: &Path) -> AppResult<Vec<String>> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Writes lines back to a file, each terminated with a newline.
pub fn write_lines(file_path: &Path, lines: &[String]) -> AppResult<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(file_path, content)?;
    Ok(())
}

/// Replaces one line (1-based) in a file. Returns the old line, or `None`
/// when the line number is out of range.
pub fn update_line(file_path: &Path, line_number: usize, new_content: &str) -> AppResult<Option<String>> {
    let mut lines = read_lines(file_path)?;
    if line_number == 0 || line_number > lines.len() {
        return Ok(None);
    }
    let old = std::mem::replace(&mut lines[line_number - 1], new_content.to_string());
    write_lines(file_path, &lines)?;
    Ok(Some(old))
}

/// Appends a line to a file, creating it if needed. Returns the new 1-based
/// line number.
pub fn append_line(file_path: &Path, content: &str) -> AppResult<usize> {
    let mut lines = read_lines(file_path)?;
    lines.push(content.to_string());
    write_lines(file_path, &lines)?;
    Ok(lines.len())
}

/// Appends a line under a `## <section>` heading, before the next heading.
///
/// When the section does not exist it is created at the end of the file.
/// Returns the 1-based line number of the inserted line.
pub fn append_to_section(file_path: &Path, section: &str, content: &str) -> AppResult<usize> {
    let mut lines = read_lines(file_path)?;
    let header = format!("## {}", section);

    let section_start = lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case(&header));

    let Some(start) = section_start else {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(header);
        lines.push(String::new());
        lines.push(content.to_string());
        write_lines(file_path, &lines)?;
        return Ok(lines.len());
    };

    // Section body runs until the next heading or end of file; insert after
    // its last non-empty line.
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("## "))
        .map(|i| start + 1 + i)
        .unwrap_or(lines.len());
    let pos = lines[start + 1..end]
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| start + 2 + i)
        .unwrap_or(start + 1);
    lines.insert(pos, content.to_string());
    write_lines(file_path, &lines)?;
    Ok(pos + 1)
}

/// Creates a daily log file with its date header, if missing.
pub fn create_daily_file(data_dir: &Path, date: NaiveDate) -> AppResult<PathBuf> {
    let path = daily_path(data_dir, date);
    if !path.exists() {
        let header = format!("# {}\n\n", date.format(DAILY_HEADER_DATE_FORMAT));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, header)?;
    }
    Ok(path)
}

/// Creates a monthly log file with its calendar scaffold, if missing.
pub fn create_monthly_file(data_dir: &Path, year: i32, month: u32) -> AppResult<PathBuf> {
    let path = monthly_path(data_dir, year, month);
    if path.exists() {
        return Ok(path);
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Journal(format!("invalid month: {:04}-{:02}", year, month)))?;

    let mut lines: Vec<String> = vec![
        format!("# {} {}", first.format("%B"), year),
        String::new(),
        "## Calendar".to_string(),
        String::new(),
    ];

    const DAY_ABBRS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];
    let mut day = first;
    while day.month() == month {
        let weekday = day.weekday().num_days_from_monday() as usize;
        lines.push(format!("{:02} {}", day.day(), DAY_ABBRS[weekday]));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    lines.extend([String::new(), "## Tasks".to_string(), String::new()]);
    write_lines(&path, &lines)?;
    Ok(path)
}

/// Creates the future log file, if missing.
pub fn create_future_file(data_dir: &Path) -> AppResult<PathBuf> {
    let path = future_path(data_dir);
    if !path.exists() {
        fs::create_dir_all(data_dir)?;
        fs::write(&path, "# Future Log\n\n## Someday\n\n")?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths() {
        let data = Path::new("/data");
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(daily_path(data, d), PathBuf::from("/data/daily/2024-03-05.md"));
        assert_eq!(monthly_path(data, 2024, 3), PathBuf::from("/data/months/2024-03.md"));
        assert_eq!(future_path(data), PathBuf::from("/data/future.md"));
        assert_eq!(
            collection_path(data, "projects/garden"),
            PathBuf::from("/data/collections/projects/garden.md")
        );
        assert_eq!(
            collection_path(data, "reading"),
            PathBuf::from("/data/collections/reading.md")
        );
    }

    #[test]
    fn test_determine_container() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(determine_container("daily/2024-03-05.md"), Container::Daily(d));
        assert_eq!(
            determine_container("months/2024-03.md"),
            Container::Monthly("2024-03".to_string())
        );
        assert_eq!(determine_container("future.md"), Container::Future);
        assert_eq!(determine_container("index.md"), Container::IndexPage);
        assert_eq!(
            determine_container("collections/projects/garden.md"),
            Container::Collection("projects/garden".to_string())
        );
        assert_eq!(
            determine_container("collections/reading.md"),
            Container::Collection("reading".to_string())
        );
        // Stray files become loose collections.
        assert_eq!(
            determine_container("scratch.md"),
            Container::Collection("scratch".to_string())
        );
        // A daily file with a bad date is not a daily container.
        assert_eq!(
            determine_container("daily/notes.md"),
            Container::Collection("notes".to_string())
        );
    }

    #[test]
    fn test_relative_path_normalization() {
        let dir = tempdir().unwrap();
        let data = dir.path();
        let file = data.join("daily").join("2024-03-05.md");
        assert_eq!(relative_path(data, &file), "daily/2024-03-05.md");
    }

    #[test]
    fn test_walk_markdown_files() {
        let dir = tempdir().unwrap();
        let data = dir.path();
        ensure_data_dirs(data).unwrap();
        fs::write(data.join("daily").join("2024-03-05.md"), "[ ] x\n").unwrap();
        fs::write(data.join("future.md"), "# Future Log\n").unwrap();
        fs::write(data.join("notes.txt"), "not markdown\n").unwrap();

        let files = walk_markdown_files(data);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "md"));
    }

    #[test]
    fn test_update_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.md");
        write_lines(&path, &["one".into(), "two".into(), "three".into()]).unwrap();

        let old = update_line(&path, 2, "TWO").unwrap();
        assert_eq!(old.as_deref(), Some("two"));
        assert_eq!(read_lines(&path).unwrap(), vec!["one", "TWO", "three"]);

        assert!(update_line(&path, 0, "x").unwrap().is_none());
        assert!(update_line(&path, 99, "x").unwrap().is_none());
    }

    #[test]
    fn test_append_to_section_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.md");
        write_lines(
            &path,
            &[
                "# March 2024".into(),
                "".into(),
                "## Tasks".into(),
                "".into(),
                "[ ] existing".into(),
                "".into(),
                "## Notes".into(),
            ],
        )
        .unwrap();

        append_to_section(&path, "Tasks", "[ ] new one").unwrap();
        let lines = read_lines(&path).unwrap();
        let tasks_idx = lines.iter().position(|l| l == "## Tasks").unwrap();
        let notes_idx = lines.iter().position(|l| l == "## Notes").unwrap();
        let new_idx = lines.iter().position(|l| l == "[ ] new one").unwrap();
        assert!(tasks_idx < new_idx && new_idx < notes_idx);
    }

    #[test]
    fn test_append_to_section_missing_creates_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.md");
        write_lines(&path, &["# Title".into()]).unwrap();

        append_to_section(&path, "Tasks", "[ ] new one").unwrap();
        let lines = read_lines(&path).unwrap();
        assert!(lines.contains(&"## Tasks".to_string()));
        assert_eq!(lines.last().unwrap(), "[ ] new one");
    }

    #[test]
    fn test_create_monthly_file_scaffold() {
        let dir = tempdir().unwrap();
        let path = create_monthly_file(dir.path(), 2024, 2).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# February 2024"));
        assert!(content.contains("## Calendar"));
        assert!(content.contains("29 Th")); // leap day
        assert!(content.contains("## Tasks"));

        // Idempotent.
        create_monthly_file(dir.path(), 2024, 2).unwrap();
    }

    #[test]
    fn test_create_daily_and_future_files() {
        let dir = tempdir().unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let daily = create_daily_file(dir.path(), d).unwrap();
        assert!(fs::read_to_string(&daily).unwrap().starts_with("# March 05, 2024"));

        let future = create_future_file(dir.path()).unwrap();
        assert!(fs::read_to_string(&future).unwrap().contains("## Someday"));
    }
}
