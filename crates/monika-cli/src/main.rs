use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use monika_config::{default_config_path, write_config, Config, LoadedConfig};
use monika_core::dispatcher::render_facts;
use monika_core::{Dispatcher, FactStore};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Parser)]
#[command(name = "monika", about = "Tiny assistant that remembers facts", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fact folder (overrides memory.folder from the config)
    #[arg(short, long)]
    folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive prompt (default)
    Chat {
        /// Handle a single command and exit
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Print every stored fact
    Facts,
    /// Show configuration and storage status
    Status,
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        return run_init(&cli.config.unwrap_or_else(default_config_path));
    }

    let loaded = LoadedConfig::discover(cli.config.as_deref())?;
    let folder = cli.folder.unwrap_or_else(|| loaded.fact_folder());

    match cli.command {
        Some(Commands::Status) => run_status(&loaded, &folder),
        Some(Commands::Facts) => {
            let store = FactStore::open(&folder)?;
            println!("{}", render_facts(&store.all_facts()));
            Ok(())
        }
        Some(Commands::Chat {
            message: Some(message),
        }) => {
            let mut dispatcher = Dispatcher::new(FactStore::open(&folder)?);
            println!("{}", dispatcher.handle(&message).await?);
            Ok(())
        }
        Some(Commands::Chat { message: None }) | None => {
            let store = FactStore::open(&folder)?;
            tracing::info!(
                "Loaded {} fact(s) from {}",
                store.len(),
                store.folder().display()
            );
            run_interactive(Dispatcher::new(store), &loaded).await
        }
        Some(Commands::Init) => unreachable!(),
    }
}

async fn run_interactive(mut dispatcher: Dispatcher, loaded: &LoadedConfig) -> Result<()> {
    let history_path = loaded.history_file();

    let mut rl = DefaultEditor::new()?;
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    tracing::info!("monika started. Type your commands below.");

    let result: Result<()> = loop {
        match rl.readline(&loaded.config.cli.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }
                // Store failures are fatal; parse problems come back as replies.
                let reply = dispatcher.handle(&line).await?;
                println!("{reply}");
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                // stdout carries replies only
                tracing::info!("End of input, goodbye!");
                break Ok(());
            }
            Err(err) => break Err(err.into()),
        }
    };

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history to {}: {e}", path.display());
        }
    }

    result
}

/// Write a default config unless one already exists.
fn run_init(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        println!("To reset, delete it and run `monika init` again.");
        return Ok(());
    }

    let config = Config::default();
    write_config(config_path, &config)?;
    println!("Created config: {}", config_path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn run_status(loaded: &LoadedConfig, folder: &Path) -> Result<()> {
    println!("monika status");
    println!();

    match loaded.source {
        Some(ref path) => println!("  Config:  {}", path.display()),
        None => println!(
            "  Config:  none found (looked for {}), using defaults",
            monika_config::config_candidates()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }

    if folder.is_dir() {
        let store = FactStore::open(folder)?;
        println!("  Folder:  {} (found)", folder.display());
        println!("  Facts:   {}", store.len());
    } else {
        println!("  Folder:  {} (not created yet)", folder.display());
        println!("  Facts:   0");
    }

    Ok(())
}
