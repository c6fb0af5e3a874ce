//! cmm - catalog administration tool
//!
//! **Usage:**
//! ```bash
//! cmm [--root-folder <DIR>] [--config <FILE>] <COMMAND>
//! cmm init
//! cmm make-admin listener@example.com
//! cmm search "бетховен 5"
//! cmm check-genre Simphony
//! cmm random-work --exclude 3,7
//! cmm stats
//! ```
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmm_catalog::db::{dashboard, genres, random_work, users};
use cmm_catalog::search::universal_search;
use cmm_catalog::AppState;
use cmm_common::config::RootFolderResolver;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Classical music catalog administration
#[derive(Parser, Debug)]
#[clap(name = "cmm", version)]
struct Args {
    /// Root folder holding the database and media (overrides CMM_ROOT)
    #[clap(long, global = true, value_name = "DIR")]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to the platform config location)
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the root folder, media folders and database schema
    Init,

    /// Grant admin rights to an existing user
    MakeAdmin {
        email: String,

        /// Revoke instead of grant
        #[clap(long)]
        revoke: bool,
    },

    /// Fuzzy search across composers, works, compositions and recordings
    Search { query: String },

    /// Check a genre name for likely typos of existing genres
    CheckGenre {
        name: String,

        /// Create the genre when it is not a typo
        #[clap(long)]
        create: bool,
    },

    /// Pick a random playable work and one performance of it
    RandomWork {
        /// Work ids to skip, comma separated
        #[clap(long, value_delimiter = ',')]
        exclude: Vec<i64>,
    },

    /// Catalog totals and the dashboard work lists
    Stats,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting cmm v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut resolver = RootFolderResolver::new(args.root_folder.clone());
    if let Some(path) = &args.config {
        resolver = resolver.with_config_file(path);
    }
    let config = resolver.resolve();
    info!("Root folder: {}", config.root_folder.display());

    let state = AppState::open(&config)
        .await
        .with_context(|| format!("Failed to open catalog at {}", config.root_folder.display()))?;

    match args.command {
        Command::Init => {
            info!("Database ready: {}", config.database_path().display());
            print_json(&json!({
                "root_folder": config.root_folder,
                "database": config.database_path(),
            }))?;
        }
        Command::MakeAdmin { email, revoke } => {
            let user = users::set_admin(&state.db, &email, !revoke).await?;
            print_json(&user)?;
        }
        Command::Search { query } => {
            let results = universal_search(&state.db, &query).await?;
            print_json(&results)?;
        }
        Command::CheckGenre { name, create } => {
            if create {
                let genre = genres::check_and_create(&state.db, &name).await?;
                print_json(&genre)?;
            } else {
                let similar = genres::check_typo(&state.db, &name).await?;
                print_json(&json!({ "similar": similar.map(|g| g.name) }))?;
            }
        }
        Command::RandomWork { exclude } => {
            let picked = random_work::random_playable_work(&state.db, &exclude).await?;
            print_json(&picked)?;
        }
        Command::Stats => {
            let summary = dashboard::get_dashboard_summary(&state.db).await?;
            print_json(&summary)?;
        }
    }

    state.db.close().await;
    Ok(())
}
