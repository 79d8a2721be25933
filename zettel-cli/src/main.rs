//! # zettel CLI
//!
//! Command-line interface for the zettel search index and theme tooling.

mod agent;
mod book;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zettel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "zettel.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the book's index
    Search {
        /// Search query
        query: String,

        /// Maximum results to return (defaults to search.limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,

        /// Filter by record types (comma separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Payload file (overrides the configured one)
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Validate the payload against the built site
    Check {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Payload file (overrides the configured one)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Built site root (overrides paths.output)
        #[arg(long)]
        site: Option<PathBuf>,
    },

    /// Print the payload's records as JSON
    Export {
        /// Payload file (overrides the configured one)
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Write a payload file from a JSON array of records
    Pack {
        /// JSON file holding the records
        records: PathBuf,

        /// Search style recorded in the payload
        #[arg(long, default_value = "textbook")]
        style: String,

        /// Output file (defaults to the configured payload path)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dark-theme script management
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Print the theme script
    Script,

    /// Write the theme script into the site and reference it from every page
    Install {
        /// Built site root (overrides paths.output)
        #[arg(long)]
        site: Option<PathBuf>,

        /// Only write the script; leave pages untouched
        #[arg(long)]
        no_inject: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            json,
            types,
            index,
        } => {
            let opts = commands::SearchOptions {
                limit,
                json,
                types,
                index,
            };
            commands::search_book(&cli.config, &query, opts)
        }
        Commands::Check { json, index, site } => {
            commands::check_payload(&cli.config, index.as_deref(), site.as_deref(), json)
        }
        Commands::Export { index } => commands::export_records(&cli.config, index.as_deref()),
        Commands::Pack {
            records,
            style,
            out,
        } => commands::pack_records(&cli.config, &records, &style, out.as_deref()),
        Commands::Theme { command } => match command {
            ThemeCommands::Script => commands::print_theme_script(),
            ThemeCommands::Install { site, no_inject } => {
                commands::install_theme(&cli.config, site.as_deref(), no_inject)
            }
        },
    }
}
