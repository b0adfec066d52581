//! modpack-translate - In-place translation of modpack text assets
//!
//! Entry point: parses arguments, sets up logging and configuration, then runs the
//! directory workflow on a folder given on the command line or typed at the prompt.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modpack_translate::cli::{prompt_folder, Args, Commands};
use modpack_translate::config::{Config, DEFAULT_CONFIG_FILE};
use modpack_translate::error::ModpackError;
use modpack_translate::workflow::{RunReport, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file; the guard flushes the file writer on exit
    let _guard = setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;
    if args.no_backup {
        config.scan.make_backups = false;
    }

    match args.command.unwrap_or(Commands::Translate { folder: None }) {
        Commands::Translate { folder } => {
            let folder = resolve_folder(folder)?;
            let mut workflow = Workflow::new(config)?;
            let report = workflow.process_directory(&folder).await?;
            print_report(&report);
        }
        Commands::Extract { folder } => {
            let folder = resolve_folder(folder)?;
            let workflow = Workflow::new(config)?;
            let listings = workflow.extract_directory(&folder).await?;

            if listings.is_empty() {
                println!("No phrases found.");
            }
            for listing in &listings {
                let relative = pathdiff::diff_paths(&listing.path, &folder)
                    .unwrap_or_else(|| listing.path.clone());
                println!("\n{} ({} phrases)", relative.display(), listing.phrases.len());
                for phrase in &listing.phrases {
                    println!("  {}", phrase);
                }
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// `--config`, else `modpack-translate.toml` in the current directory, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
            Config::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => Config::default(),
    };
    Ok(config)
}

/// Folder from the command line, or typed at the prompt
fn resolve_folder(folder: Option<PathBuf>) -> Result<PathBuf> {
    let folder = match folder {
        Some(folder) => folder,
        None => prompt_folder(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
    };

    if !folder.is_dir() {
        return Err(ModpackError::InvalidFolder(folder.display().to_string()).into());
    }
    Ok(folder)
}

fn print_report(report: &RunReport) {
    println!("\nFiles found:        {}", report.files_found);
    println!("Translated:         {}", report.translated);
    println!("Without phrases:    {}", report.without_phrases);
    if report.interrupted > 0 {
        println!("Partly translated:  {}", report.interrupted);
    }
    if !report.skipped.is_empty() {
        println!("Skipped:            {}", report.skipped.len());
        for (path, reason) in &report.skipped {
            println!("  {}: {}", path.display(), reason);
        }
    }
    println!(
        "Phrases translated: {} ({} requests, {} cache hits, {} failed)",
        report.stats.translated, report.stats.requests, report.stats.cache_hits, report.stats.failed
    );

    if report.stopped_early {
        println!("\n🚨 Translation quota reached, run stopped early. Re-run later to finish.");
    } else if report.quota_reached {
        println!("\n🚨 Translation quota reached on the last file. Re-run later to finish it.");
    }
    if let Some(backup_root) = &report.backup_root {
        println!("\n✅ Backups stored in {}", backup_root.display());
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".modpack-translate").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation, written off the main thread
    let file_appender = rolling::daily(&log_dir, "modpack-translate.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("modpack-translate.log").display());

    Ok(guard)
}
