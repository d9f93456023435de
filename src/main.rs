//! # Content Catalog CLI (`catalog`)
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog init` | Create the SQLite database and run schema migrations |
//! | `catalog sync` | Rebuild the catalog from the content source tree |
//! | `catalog find` | Best-match lookup by name, display name, or description |
//! | `catalog favorite set <account> <name>` | Mark (or with `--unset`, unmark) a favorite |
//! | `catalog favorite list <account>` | List an account's favorites |
//! | `catalog tools` | List registered tools |
//!
//! Logs go to stderr and are filtered with `RUST_LOG`
//! (default `content_catalog=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use content_catalog::search::SearchParams;
use content_catalog::{config, favorites, migrate, reconcile, search, tools};

/// Content Catalog: tutorials and help topics with fuzzy lookup.
#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Content Catalog: tutorials and help topics with fuzzy lookup",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Rebuild the catalog from the content source tree.
    ///
    /// Deletes every content item and tag, recreates them from the
    /// descriptors under `[content].root`, and restores favorites whose
    /// target still exists. Exits non-zero if any item failed.
    Sync,

    /// Find the best-matching tutorial or help topic.
    ///
    /// Prints the JSON response. At least one of `--name`,
    /// `--display-name`, or `--description` is required.
    Find {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        display_name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Maximum per-word edit distance for fuzzy matches.
        #[arg(long)]
        max_distance: Option<usize>,

        /// Accepted for compatibility; only the best match is returned.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage per-account favorites.
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// List registered tools.
    Tools,
}

#[derive(Subcommand)]
enum FavoriteAction {
    /// Mark a content item as a favorite.
    Set {
        account: String,
        name: String,

        /// Unmark instead.
        #[arg(long)]
        unset: bool,
    },
    /// List the favorites of an account.
    List { account: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("content_catalog=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Tools = cli.command {
        tools::run_list_tools();
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync => {
            reconcile::run_sync(&cfg).await?;
        }
        Commands::Find {
            name,
            display_name,
            description,
            max_distance,
            limit,
        } => {
            let defaults = SearchParams::from_config(&cfg.retrieval);
            let params = SearchParams {
                name,
                display_name,
                description,
                max_edit_distance: max_distance.unwrap_or(defaults.max_edit_distance),
                limit: limit.unwrap_or(defaults.limit),
            };
            search::run_find(&cfg, params).await?;
        }
        Commands::Favorite { action } => match action {
            FavoriteAction::Set {
                account,
                name,
                unset,
            } => {
                favorites::run_set_favorite(&cfg, &account, &name, !unset).await?;
            }
            FavoriteAction::List { account } => {
                favorites::run_list_favorites(&cfg, &account).await?;
            }
        },
        Commands::Tools => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
