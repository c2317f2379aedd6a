//! Integration tests for the operation layer, run against a real corpus and
//! index in a temporary directory.

use bujo::config::{Config, SignifierTable};
use bujo::db::entries::EntryFilter;
use bujo::db::Database;
use bujo::errors::{AppError, MigrationError};
use bujo::model::{EntryType, TaskStatus};
use bujo::ops;
use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

struct Env {
    _dir: TempDir,
    config: Config,
    db: Database,
}

fn setup() -> Env {
    let dir = TempDir::new().unwrap();
    let config = Config {
        bujo_dir: dir.path().to_path_buf(),
        data_dir: dir.path().join("data"),
        cache_db: dir.path().join("cache.db"),
        lock_file: dir.path().join(".bujo.lock"),
        editor: "true".to_string(),
        signifiers: SignifierTable::default_table(),
    };
    bujo::journal::ensure_data_dirs(&config.data_dir).unwrap();
    let db = Database::open(&config.cache_db).unwrap();
    db.initialize_schema().unwrap();
    Env {
        _dir: dir,
        config,
        db,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_add_writes_file_and_indexes() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    assert_eq!(entry.content, "Call the bank");
    assert_eq!(entry.status, Some(TaskStatus::Open));
    assert_eq!(entry.source_file, "daily/2024-03-05.md");
    assert_eq!(entry.entry_ref.len(), 8);

    let content = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert!(content.contains("[ ] Call the bank"));
    assert!(content.starts_with("# March 05, 2024"));
}

#[test]
fn test_done_rewrites_line_and_index() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let done = ops::complete_task(&env.db, &env.config, &entry.entry_ref).unwrap();
    assert_eq!(done.status, Some(TaskStatus::Complete));
    assert!(done.completed_at.is_some());
    // Content-derived reference survives the status flip.
    assert_eq!(done.entry_ref, entry.entry_ref);

    let content = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert!(content.contains("[x] Call the bank"));
    assert!(!content.contains("[ ] Call the bank"));

    // A second done is rejected.
    let err = ops::complete_task(&env.db, &env.config, &entry.entry_ref).unwrap_err();
    match err {
        AppError::Migration(MigrationError::AlreadyClosed { status, .. }) => {
            assert_eq!(status, "complete");
        }
        other => panic!("Expected AlreadyClosed, got {:?}", other),
    }
}

#[test]
fn test_done_by_unambiguous_prefix() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let prefix = &entry.entry_ref[..4];
    let done = ops::complete_task(&env.db, &env.config, prefix).unwrap();
    assert_eq!(done.entry_ref, entry.entry_ref);
}

#[test]
fn test_done_rejects_notes() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Note,
        "Just a thought",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let err = ops::complete_task(&env.db, &env.config, &entry.entry_ref).unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::NotATask(_))
    ));
}

#[test]
fn test_migrate_to_monthly_round_trip() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let dest = ops::Destination::parse("2024-04").unwrap();
    let moved = ops::migrate_task(&env.db, &env.config, &entry.entry_ref, &dest).unwrap();

    assert_eq!(moved.source_file, "months/2024-04.md");
    assert_eq!(moved.status, Some(TaskStatus::Open));
    assert_eq!(moved.migrated_from.as_deref(), Some("daily/2024-03-05.md"));
    assert_ne!(moved.entry_ref, entry.entry_ref);

    // Source line now shows the migrated marker and forward hint.
    let source = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert!(source.contains("[>] Call the bank →months/2024-04.md"));

    // Destination copy sits in the Tasks section with a back-pointer.
    let dest_content =
        fs::read_to_string(env.config.data_dir.join("months/2024-04.md")).unwrap();
    assert!(dest_content.contains("[ ] Call the bank ←daily/2024-03-05.md"));
    assert!(dest_content.contains("## Tasks"));

    // The source copy is closed now; migrating it again is rejected.
    let err = ops::migrate_task(&env.db, &env.config, &entry.entry_ref, &dest).unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::AlreadyClosed { .. })
    ));
}

#[test]
fn test_schedule_marks_source_scheduled() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let moved =
        ops::schedule_task(&env.db, &env.config, &entry.entry_ref, Some("2024-06")).unwrap();
    assert_eq!(moved.source_file, "future.md");
    assert_eq!(moved.status, Some(TaskStatus::Open));

    let source = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert!(source.contains("[<] Call the bank →future.md"));

    // The copy lands under the month section of the future log.
    let future = fs::read_to_string(env.config.data_dir.join("future.md")).unwrap();
    assert!(future.contains("## 2024-06"));
    assert!(future.contains("[ ] Call the bank ←daily/2024-03-05.md"));
}

#[test]
fn test_schedule_someday() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Learn the accordion",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let moved = ops::schedule_task(&env.db, &env.config, &entry.entry_ref, None).unwrap();
    assert_eq!(moved.source_file, "future.md");

    let future = fs::read_to_string(env.config.data_dir.join("future.md")).unwrap();
    assert!(future.contains("## Someday"));
    assert!(future.contains("[ ] Learn the accordion ←daily/2024-03-05.md"));

    let err = ops::schedule_task(&env.db, &env.config, &entry.entry_ref, Some("June")).unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::InvalidDestination(_))
    ));
}

#[test]
fn test_migrate_to_missing_collection_leaves_files_untouched() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();
    let before = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();

    let dest = ops::Destination::parse("collection/no-such-thing").unwrap();
    let err = ops::migrate_task(&env.db, &env.config, &entry.entry_ref, &dest).unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::CollectionNotFound(_))
    ));

    let after = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert_eq!(before, after);
}

#[cfg(unix)]
#[test]
fn test_migrate_rolls_back_source_when_destination_write_fails() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();
    let before = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();

    // A dangling symlink where the monthly log should be makes the append
    // fail after the source line has already been rewritten.
    let months = env.config.data_dir.join("months");
    fs::create_dir_all(&months).unwrap();
    std::os::unix::fs::symlink(
        months.join("missing-dir/2024-04.md"),
        months.join("2024-04.md"),
    )
    .unwrap();

    let dest = ops::Destination::parse("2024-04").unwrap();
    let err = ops::migrate_task(&env.db, &env.config, &entry.entry_ref, &dest).unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::DestinationUnwritable { .. })
    ));

    // Source restored byte for byte.
    let after = fs::read_to_string(env.config.data_dir.join("daily/2024-03-05.md")).unwrap();
    assert_eq!(before, after);

    // And the task is still open in the index.
    let still_open = ops::list_entries(
        &env.db,
        &EntryFilter {
            status: Some(TaskStatus::Open),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(still_open.len(), 1);
}

#[test]
fn test_history_follows_the_chain() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let hop1 = ops::migrate_task(
        &env.db,
        &env.config,
        &entry.entry_ref,
        &ops::Destination::parse("2024-04").unwrap(),
    )
    .unwrap();
    let hop2 = ops::migrate_task(
        &env.db,
        &env.config,
        &hop1.entry_ref,
        &ops::Destination::parse("future").unwrap(),
    )
    .unwrap();

    // The chain reads the same from any hop.
    for entry_ref in [&entry.entry_ref, &hop1.entry_ref, &hop2.entry_ref] {
        let chain = ops::task_history(&env.db, entry_ref).unwrap();
        let files: Vec<&str> = chain.iter().map(|e| e.source_file.as_str()).collect();
        assert_eq!(
            files,
            vec!["daily/2024-03-05.md", "months/2024-04.md", "future.md"]
        );
    }
}

#[test]
fn test_search_finds_single_match() {
    let env = setup();
    ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();
    ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Note,
        "Water the plants",
        None,
        date("2024-03-05"),
    )
    .unwrap();

    let hits = ops::search(&env.db, "bank", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.content, "Call the bank");
}

#[test]
fn test_list_date_range() {
    let env = setup();
    ops::add_entry(&env.db, &env.config, EntryType::Task, "early", None, date("2024-03-01"))
        .unwrap();
    ops::add_entry(&env.db, &env.config, EntryType::Task, "inside", None, date("2024-03-10"))
        .unwrap();
    ops::add_entry(&env.db, &env.config, EntryType::Task, "late", None, date("2024-03-20"))
        .unwrap();

    let inside = ops::list_entries(
        &env.db,
        &EntryFilter {
            date_from: Some(date("2024-03-05")),
            date_to: Some(date("2024-03-15")),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].content, "inside");

    let from_only = ops::list_entries(
        &env.db,
        &EntryFilter {
            date_from: Some(date("2024-03-10")),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(from_only.len(), 2);
}

#[test]
fn test_stats_counts() {
    let env = setup();
    ops::add_entry(&env.db, &env.config, EntryType::Task, "a", None, date("2024-03-05")).unwrap();
    ops::add_entry(&env.db, &env.config, EntryType::Event, "b", None, date("2024-03-05")).unwrap();
    ops::add_entry(&env.db, &env.config, EntryType::Note, "c", None, date("2024-03-05")).unwrap();

    let stats = ops::stats(&env.db, None).unwrap();
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.tasks, 1);
    assert_eq!(stats.events, 1);
    assert_eq!(stats.notes, 1);
    assert_eq!(stats.open_tasks, 1);
    assert_eq!(stats.files_indexed, 1);
}

#[test]
fn test_index_is_disposable() {
    let env = setup();
    let entry = ops::add_entry(
        &env.db,
        &env.config,
        EntryType::Task,
        "Call the bank",
        None,
        date("2024-03-05"),
    )
    .unwrap();
    drop(env.db);

    // Delete the index and rebuild from the text alone.
    fs::remove_file(&env.config.cache_db).unwrap();
    let db = Database::open(&env.config.cache_db).unwrap();
    db.initialize_schema().unwrap();
    ops::reindex(&db, &env.config, ops::ReindexMode::Full).unwrap();

    let rebuilt = ops::list_entries(&db, &EntryFilter::default()).unwrap();
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt[0].entry_ref, entry.entry_ref);
    assert_eq!(rebuilt[0].content, "Call the bank");
}
