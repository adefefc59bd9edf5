use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use dejavu_core::report::{
    gather_report_data, generate_json_report, generate_text_report, highlight_line, save_report,
};
use dejavu_core::settings::{
    DATABASE_FILE_NAME, SETTINGS_FILE_NAME, apply_overrides, default_database_path,
    default_settings_path, expand_path, load_config, save_config,
};
use dejavu_core::{Database, HistoryFile, HistoryRecord, ReportFormat};
use dejavu_engine::{
    ClassificationDecision, ClassificationEngine, ComparisonConfig, HistoryReplayer,
    ReplayProgressCallback, Toggle,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};

pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // a second init in the same process (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn print_banner() {
    println!(
        "{} {}",
        "dejavu".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "haven't I seen this request before?".bright_black());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

// Argument helpers

pub fn resolve_db_path(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("db")
        .map(|p| expand_path(&p.to_string_lossy()))
        .unwrap_or_else(default_database_path)
}

pub fn resolve_settings_path(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("settings")
        .map(|p| expand_path(&p.to_string_lossy()))
        .unwrap_or_else(default_settings_path)
}

fn toggles(args: &ArgMatches, id: &str) -> Vec<Toggle> {
    args.get_many::<Toggle>(id)
        .map(|values| values.copied().collect())
        .unwrap_or_default()
}

/// Settings file plus any `--enable` / `--disable` overrides.
pub fn build_config(args: &ArgMatches) -> Result<ComparisonConfig> {
    let path = resolve_settings_path(args);
    let config = load_config(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    Ok(apply_overrides(
        config,
        &toggles(args, "enable"),
        &toggles(args, "disable"),
    ))
}

fn open_database(path: &Path) -> Result<Database> {
    if !Database::exists(path) {
        bail!(
            "No database at {}. Run `dejavu init` first or pass --db",
            path.display()
        );
    }
    Database::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

// Operations shared by the handlers

/// Classify records in order against a fresh engine, as live traffic would be.
pub fn classify_records(
    engine: &ClassificationEngine,
    records: &[HistoryRecord],
) -> Result<Vec<(u64, ClassificationDecision)>> {
    records
        .iter()
        .map(|record| -> Result<(u64, ClassificationDecision)> {
            let request = record.to_request()?;
            Ok((request.id, engine.classify(&request)))
        })
        .collect()
}

/// Append every record of a capture file to the database.
pub fn import_history(db: &mut Database, file: &Path) -> Result<usize> {
    let history = HistoryFile::open(file)
        .with_context(|| format!("Failed to read capture file {}", file.display()))?;

    // ids belong to the database; the file's numbering is only positional
    let records: Vec<HistoryRecord> = history
        .records()
        .iter()
        .cloned()
        .map(|mut record| {
            record.id = None;
            record
        })
        .collect();

    Ok(db.record_requests(&records)?)
}

/// Re-highlight the whole stored history from an empty registry.
pub fn replay_database(
    db: &Database,
    config: ComparisonConfig,
    progress_callback: Option<ReplayProgressCallback>,
) -> Result<usize> {
    let engine = ClassificationEngine::new(config);
    let mut replayer = HistoryReplayer::new(&engine);
    if let Some(callback) = progress_callback {
        replayer = replayer.with_progress_callback(callback);
    }

    Ok(replayer.replay_all(db, db)?)
}

pub fn render_config(config: &ComparisonConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

pub fn render_report(db: &Database, format: ReportFormat) -> Result<String> {
    let data = gather_report_data(db)?;
    match format {
        ReportFormat::Text => Ok(generate_text_report(&data)),
        ReportFormat::Json => Ok(generate_json_report(&data)?),
    }
}

// Handlers

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  DEJAVU INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/dejavu/");
    let force = args.get_flag("force");
    let expanded_config_dir = shellexpand::tilde(config_dir);
    let dejavu_config_dir = Path::new(expanded_config_dir.as_ref());
    let db_path = dejavu_config_dir.join(DATABASE_FILE_NAME);
    let settings_path = dejavu_config_dir.join(SETTINGS_FILE_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        dejavu_config_dir.display().to_string().bright_white()
    );
    println!();

    let db_exists = Database::exists(&db_path);
    let settings_exist = settings_path.exists();

    if (db_exists || settings_exist) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Existing installation found:");
        if db_exists {
            println!("  {} {}", "•".yellow(), db_path.display().to_string().bright_white());
        }
        if settings_exist {
            println!(
                "  {} {}",
                "•".yellow(),
                settings_path.display().to_string().bright_white()
            );
        }
        println!();
        println!("{}", "This operation will overwrite existing files.".yellow());

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    initialize_installation(dejavu_config_dir)?;

    println!("{} Config directory: {}", "✓".green().bold(), dejavu_config_dir.display());
    println!("{} Database: {}", "✓".green().bold(), db_path.display());
    println!("{} Settings: {}", "✓".green().bold(), settings_path.display());
    println!();
    println!("{}", "Dejavu initialization complete!".bright_green().bold());
    Ok(())
}

/// Create the config directory, a fresh database and default settings,
/// replacing whatever was there.
pub fn initialize_installation(config_dir: &Path) -> Result<()> {
    let db_path = config_dir.join(DATABASE_FILE_NAME);
    let settings_path = config_dir.join(SETTINGS_FILE_NAME);

    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    if Database::exists(&db_path) {
        Database::drop(&db_path)?;
    }
    Database::new(&db_path)?;
    save_config(&settings_path, &ComparisonConfig::default())?;

    info!("Initialized dejavu in {}", config_dir.display());
    Ok(())
}

pub fn handle_import(args: &ArgMatches) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("FILE")
        .context("A capture file is required")?;
    let db_path = resolve_db_path(args);
    let mut db = open_database(&db_path)?;

    let count = import_history(&mut db, file)?;
    println!(
        "{} Imported {} requests into {}",
        "✓".green().bold(),
        count,
        db_path.display()
    );
    Ok(())
}

pub fn handle_classify(args: &ArgMatches) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("FILE")
        .context("A capture file is required")?;
    let history = HistoryFile::open(file)
        .with_context(|| format!("Failed to read capture file {}", file.display()))?;
    let engine = ClassificationEngine::new(build_config(args)?);

    let decisions = classify_records(&engine, history.records())?;
    for (record, (id, decision)) in history.records().iter().zip(&decisions) {
        println!("{}", highlight_line(*id, &record.method, &record.url, *decision));
    }

    let repeats = decisions
        .iter()
        .filter(|(_, d)| *d != ClassificationDecision::Unique)
        .count();
    println!();
    println!(
        "{} {}: {} requests, {} unique, {} repeated or static",
        "✓".green().bold(),
        history.path().display(),
        decisions.len(),
        decisions.len() - repeats,
        repeats
    );
    Ok(())
}

pub fn handle_replay(args: &ArgMatches) -> Result<()> {
    let db = open_database(&resolve_db_path(args))?;
    let config = build_config(args)?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    bar.set_message("re-highlighting");

    let bar_clone = bar.clone();
    let callback: ReplayProgressCallback = Arc::new(move |done: usize, total: usize| {
        bar_clone.set_length(total as u64);
        bar_clone.set_position(done as u64);
    });

    let count = replay_database(&db, config, Some(callback));
    bar.finish_and_clear();
    let count = count?;

    println!("Re-highlight complete: {} entries updated.", count);
    Ok(())
}

pub fn handle_reset(args: &ArgMatches) -> Result<()> {
    let db = open_database(&resolve_db_path(args))?;
    let cleared = db.clear_annotations()?;
    println!(
        "{} History reset: {} highlights cleared.",
        "✓".green().bold(),
        cleared
    );
    Ok(())
}

pub fn handle_config(args: &ArgMatches) -> Result<()> {
    let config = build_config(args)?;
    println!("{}", render_config(&config)?);

    if args.get_flag("write") {
        let path = resolve_settings_path(args);
        save_config(&path, &config)?;
        println!("{} Settings written to {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

pub fn handle_report(args: &ArgMatches) -> Result<()> {
    let db = open_database(&resolve_db_path(args))?;
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let report = render_report(&db, format)?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}
