//! # Label Lens CLI (`lens`)
//!
//! ## Usage
//!
//! ```bash
//! lens --config ./config/lens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lens init` | Create the SQLite database and run schema migrations |
//! | `lens ingest <path> --category <c>` | Chunk, embed, and store law text |
//! | `lens search "<query>"` | Similarity search over the law corpus |
//! | `lens prop65 <file>` | Parse the Prop 65 chemical list into JSON |
//! | `lens check` | Evaluate ingredients/claims JSON against every law |
//!
//! ## Examples
//!
//! ```bash
//! # Replace the corpus with the Prop 65 regulations
//! lens ingest law_docs/prop65 --category prop65 --replace
//!
//! # Claims-only review with per-law detail
//! echo '{"claims": ["Heals acne fast"]}' | lens check --detailed
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use label_lens::ingest::IngestOptions;
use label_lens::{check, config, ingest, logging, migrate, prop65, search};

/// Label Lens CLI: retrieval-grounded compliance checks for cosmetic
/// ingredients and marketing claims.
///
/// All commands except `prop65` read a TOML configuration file.
/// See `config/lens.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lens",
    about = "Label Lens: retrieval-grounded compliance checks for cosmetic labels",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lens.toml")]
    config: PathBuf,

    /// Log at debug level (prompts and raw model output included).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Ingest law text into the chunk store.
    ///
    /// Accepts a single `.txt` file or a directory scanned recursively for
    /// `.txt` files.
    Ingest {
        /// File or directory to ingest.
        path: PathBuf,

        /// Retrieval category the chunks belong to (e.g. `prop65`).
        #[arg(long)]
        category: String,

        /// Delete every stored chunk before ingesting.
        #[arg(long)]
        replace: bool,

        /// Dry run: show file and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Similarity search over the law corpus.
    Search {
        /// The search query string.
        query: String,

        /// Only search this category.
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Parse the plain-text Prop 65 chemical list and print JSON.
    Prop65 {
        /// Text file extracted from the published list.
        file: PathBuf,
    },

    /// Evaluate a product against every configured law.
    ///
    /// Reads `{"ingredients": [...], "claims": [...]}` from `--input` or
    /// stdin and prints the compliance report as JSON.
    Check {
        /// Read input from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Include per-law results and the average compliance score.
        #[arg(long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Commands that don't require config
    if let Commands::Prop65 { file } = &cli.command {
        prop65::run_prop65(file)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            path,
            category,
            replace,
            dry_run,
        } => {
            let options = IngestOptions {
                category,
                replace,
                dry_run,
            };
            ingest::run_ingest(&cfg, &path, &options).await?;
        }
        Commands::Search {
            query,
            category,
            limit,
        } => {
            search::run_search(&cfg, &query, category.as_deref(), limit).await?;
        }
        Commands::Check { input, detailed } => {
            check::run_check(&cfg, input.as_deref(), detailed).await?;
        }
        Commands::Prop65 { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
