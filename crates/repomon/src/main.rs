mod render;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast;

use repomon_core::{AutoRefresher, FolderSet};
use repomon_logging::LogFormat;
use settings::{Settings, SettingsStore};

#[derive(Parser, Debug)]
#[command(
    name = "repomon",
    about = "Watches folders of git working copies and reports branch state",
    version
)]
struct Cli {
    /// Settings file (default: platform config dir)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, e.g. "info" or "repomon_git=trace" (overrides settings)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh on a timer and re-render on every change until Ctrl+C
    Watch {
        /// Refresh interval in milliseconds (overrides settings)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Run one analysis pass and print the result
    Status {
        /// Uncolored per-repository summary instead of the tree view
        #[arg(long)]
        plain: bool,
    },
    /// Watch a new root folder
    Add { path: String },
    /// Stop watching a folder
    Remove { path: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.log_level.clone());
    let _guard =
        repomon_logging::init_tracing(&level, cli.log_format.into(), settings.log_to_file);

    let store = Arc::new(SettingsStore::new(settings_path, settings.clone()));
    let folders = Arc::new(FolderSet::new().with_sink(store));
    for path in &settings.folders {
        folders.add_folder(path).await;
    }

    match cli.command {
        Command::Watch { interval_ms } => {
            watch(
                folders,
                interval_ms.unwrap_or(settings.refresh_interval_ms),
            )
            .await
        }
        Command::Status { plain } => {
            if folders.folder_paths().is_empty() {
                eprintln!("No folders watched yet. Add one with `repomon add <path>`.");
                return Ok(());
            }
            folders.analyze().await.context("analysis pass failed")?;
            if plain {
                render::render_plain(&folders);
            } else {
                render::render(&folders);
            }
            Ok(())
        }
        Command::Add { path } => {
            let normalized = path
                .strip_suffix('/')
                .or_else(|| path.strip_suffix('\\'))
                .unwrap_or(&path)
                .to_string();
            // The data model does not deduplicate; the caller checks first.
            if folders.folder_paths().contains(&normalized) {
                eprintln!("Already watching {normalized}");
                return Ok(());
            }
            folders.add_folder(&normalized).await;
            if folders.folder_paths().contains(&normalized) {
                println!("Watching {normalized}");
            } else {
                eprintln!("Not a directory: {normalized}");
            }
            Ok(())
        }
        Command::Remove { path } => {
            folders.remove_folder(&path);
            println!("Now watching: {}", folders.folder_paths().join(", "));
            Ok(())
        }
    }
}

async fn watch(folders: Arc<FolderSet>, interval_ms: u64) -> Result<()> {
    let refresher = AutoRefresher::with_interval(folders.clone(), interval_ms);
    let mut rx = refresher.subscribe();
    refresher.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
            received = rx.recv() => {
                match received {
                    // Rendering is idempotent, so a lagged receiver just
                    // re-renders from current state.
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        render::render(&folders)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    refresher.stop();
    Ok(())
}
