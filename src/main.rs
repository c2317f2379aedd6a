/*!
# Bujo - A Plain-Text Bullet Journal

Command-line bullet journal over plain Markdown files, with a disposable
SQLite index for listing, search, and statistics.

This file contains the main application flow: configuration, the store lock,
the index database, and dispatch to the operation behind each subcommand.

## Configuration

The application is configured with environment variables:
- `BUJO_DIR`: root directory for the journal (defaults to `~/.bujo`)
- `BUJO_EDITOR` or `EDITOR`: the editor for `bujo open` (defaults to `vim`)
- `BUJO_SIGNIFIERS`: extra signifier symbols, e.g. `@=waiting,&=delegated`
*/

use bujo::cli::{parse_date_arg, CliArgs, Command};
use bujo::config::Config;
use bujo::db::entries::EntryFilter;
use bujo::db::Database;
use bujo::editor::SystemEditor;
use bujo::errors::{AppError, AppResult};
use bujo::index::ReindexReport;
use bujo::lock::StoreLock;
use bujo::model::{EntryRecord, EntryType, TaskStatus};
use bujo::ops;
use bujo::sync::GitSync;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> AppResult<()> {
    info!("Starting bujo");
    let today = Local::now().date_naive();

    let config = Config::load()?;
    config.validate()?;
    debug!("Journal root: {:?}", config.bujo_dir);
    bujo::journal::ensure_data_dirs(&config.data_dir)?;

    // Single writer: hold the store lock for the whole command.
    let _lock = StoreLock::acquire(&config.lock_file)?;

    let db = Database::open(&config.cache_db)?;
    db.initialize_schema()?;

    // Read commands want a fresh view; refresh changed files up front.
    if matches!(
        args.command,
        Command::List { .. }
            | Command::Search { .. }
            | Command::Done { .. }
            | Command::Migrate { .. }
            | Command::Schedule { .. }
            | Command::History { .. }
            | Command::Stats { .. }
    ) {
        ops::reindex(&db, &config, ops::ReindexMode::Incremental)?;
    }

    match args.command {
        Command::Add {
            content,
            entry_type,
            signifier,
            date,
        } => {
            let entry_type = EntryType::from_str_opt(&entry_type).ok_or_else(|| {
                AppError::Config(format!("unknown entry type: {}", entry_type))
            })?;
            let signifier = signifier
                .map(|c| {
                    config.signifiers.get(c).ok_or_else(|| {
                        AppError::Config(format!("unknown signifier symbol: {}", c))
                    })
                })
                .transpose()?;
            let date = parse_date_opt(date.as_deref(), today)?;

            let entry = ops::add_entry(&db, &config, entry_type, &content, signifier, date)?;
            println!("Added {} {}", entry.entry_ref, entry.raw_line);
        }

        Command::List {
            entry_type,
            status,
            signifier,
            date,
            from,
            to,
            month,
            collection,
            limit,
        } => {
            let parse_date = |s: &str| {
                parse_date_arg(s).map_err(|e| AppError::Journal(format!("invalid date: {}", e)))
            };
            let filter = EntryFilter {
                entry_type: entry_type
                    .as_deref()
                    .map(|s| {
                        EntryType::from_str_opt(s)
                            .ok_or_else(|| AppError::Config(format!("unknown entry type: {}", s)))
                    })
                    .transpose()?,
                status: status
                    .as_deref()
                    .map(|s| {
                        TaskStatus::from_str_opt(s)
                            .ok_or_else(|| AppError::Config(format!("unknown status: {}", s)))
                    })
                    .transpose()?,
                signifier: signifier
                    .map(|c| {
                        config.signifiers.get(c).ok_or_else(|| {
                            AppError::Config(format!("unknown signifier symbol: {}", c))
                        })
                    })
                    .transpose()?,
                entry_date: date.as_deref().map(parse_date).transpose()?,
                date_from: from.as_deref().map(parse_date).transpose()?,
                date_to: to.as_deref().map(parse_date).transpose()?,
                month,
                collection,
                limit,
                ..Default::default()
            };

            let entries = ops::list_entries(&db, &filter)?;
            if entries.is_empty() {
                println!("No entries found");
            }
            for entry in entries {
                print_entry(&entry);
            }
        }

        Command::Search { query, limit } => {
            let hits = ops::search(&db, &query, limit)?;
            if hits.is_empty() {
                println!("No matches");
            }
            for hit in hits {
                println!(
                    "{}  {}    ({}:{})",
                    hit.entry.entry_ref, hit.snippet, hit.entry.source_file, hit.entry.line_number
                );
            }
        }

        Command::Done { entry_ref } => {
            let entry = ops::complete_task(&db, &config, &entry_ref)?;
            println!("Completed {} {}", entry.entry_ref, entry.raw_line);
        }

        Command::Migrate {
            entry_ref,
            destination,
        } => {
            let destination = ops::Destination::parse(&destination)?;
            let entry = ops::migrate_task(&db, &config, &entry_ref, &destination)?;
            println!(
                "Migrated to {} as {} {}",
                entry.source_file, entry.entry_ref, entry.raw_line
            );
        }

        Command::Schedule { entry_ref, when } => {
            let month = if when.eq_ignore_ascii_case("someday") {
                None
            } else {
                Some(when.as_str())
            };
            let entry = ops::schedule_task(&db, &config, &entry_ref, month)?;
            println!(
                "Scheduled to {} as {} {}",
                entry.source_file, entry.entry_ref, entry.raw_line
            );
        }

        Command::History { entry_ref } => {
            let chain = ops::task_history(&db, &entry_ref)?;
            for (i, entry) in chain.iter().enumerate() {
                println!(
                    "{}. {}  {}    ({}:{})",
                    i + 1,
                    entry.entry_ref,
                    entry.raw_line,
                    entry.source_file,
                    entry.line_number
                );
            }
        }

        Command::Reindex { full } => {
            let mode = if full {
                ops::ReindexMode::Full
            } else {
                ops::ReindexMode::Incremental
            };
            let report = ops::reindex(&db, &config, mode)?;
            print_report(&report);
        }

        Command::Stats { year, month } => {
            let scope = month.or(year);
            let stats = ops::stats(&db, scope.as_deref())?;
            println!("Files indexed:    {}", stats.files_indexed);
            println!("Total entries:    {}", stats.total_entries);
            println!("  Tasks:          {}", stats.tasks);
            println!("    Open:         {}", stats.open_tasks);
            println!("    Complete:     {}", stats.completed_tasks);
            println!("  Events:         {}", stats.events);
            println!("  Notes:          {}", stats.notes);
        }

        Command::Sync => {
            let provider = GitSync::new(&config.data_dir)?;
            let report = ops::sync_corpus(&db, &config, &provider)?;
            print_report(&report);
        }

        Command::Open { date } => {
            let date = parse_date_opt(date.as_deref(), today)?;
            let editor = SystemEditor {
                editor_cmd: config.editor.clone(),
            };
            ops::open_journal(&db, &config, &editor, date)?;
        }
    }

    Ok(())
}

fn parse_date_opt(date: Option<&str>, today: NaiveDate) -> AppResult<NaiveDate> {
    match date {
        Some(s) => {
            parse_date_arg(s).map_err(|e| AppError::Journal(format!("invalid date: {}", e)))
        }
        None => Ok(today),
    }
}

fn print_entry(entry: &EntryRecord) {
    println!(
        "{}  {}    ({}:{})",
        entry.entry_ref, entry.raw_line, entry.source_file, entry.line_number
    );
}

fn print_report(report: &ReindexReport) {
    println!(
        "Indexed {} file(s) ({} entries), {} unchanged, {} removed in {:?}",
        report.files_indexed,
        report.entries_indexed,
        report.files_unchanged,
        report.files_removed,
        report.duration
    );
    for file in &report.conflicted_files {
        println!("  conflicted (skipped): {}", file);
    }
    for (file, err) in &report.failed_files {
        println!("  failed: {} ({})", file, err);
    }
}
