use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, PathOverrides};
use crate::storage::{self, DraftCache};

pub mod commands;

use self::commands::{DraftsArgs, EditArgs, ShowArgs, SubmitArgs};

#[derive(Parser, Debug)]
#[command(
    name = "brandpick",
    version,
    about = "Pick a title and thumbnail for a video from ranked candidates and local drafts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over BRANDPICK_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over BRANDPICK_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the candidate lists and the default selection for a video
    Show(ShowArgs),
    /// Record title or thumbnail drafts for a video
    Edit(EditArgs),
    /// Select tiles and emit the submission as JSON
    Submit(SubmitArgs),
    /// List locally stored drafts
    Drafts(DraftsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::discover(PathOverrides {
        config: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
    })?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let database = storage::init(&config.storage)?;

    let cache = DraftCache::new();
    database
        .hydrate(&cache)
        .context("loading stored drafts")?;
    let events = cache.subscribe();
    let catalog = config.message_catalog();

    let result = match cli.command {
        Commands::Show(args) => commands::show(&cache, catalog, args),
        Commands::Edit(args) => commands::edit(&cache, catalog, args),
        Commands::Submit(args) => commands::submit(&cache, catalog, args),
        Commands::Drafts(args) => commands::list_drafts(&database, &cache, args),
    };

    let persisted = database
        .persist_events(&cache, &events)
        .context("saving drafts")?;
    tracing::debug!(persisted, "draft store flushed");
    result
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
