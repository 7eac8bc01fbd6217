//! Card Scan command line
//!
//! Identifies Magic: The Gathering cards from photos and looks cards up on
//! Scryfall. Every command prints its result as JSON on stdout; logs go to
//! stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cardscan::{reader_from_config, resolver_from_config, CardScanner, ScanConfig};

#[derive(Debug, Parser)]
#[command(name = "cardscan", version)]
#[command(about = "Identify Magic: The Gathering cards from photos")]
struct Args {
    /// Path to a config.json (defaults to the usual search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log OCR attempts and lookup strategies
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read the card name from a photo.
    Identify {
        image: PathBuf,

        /// Also resolve the name to a card record
        #[arg(long)]
        resolve: bool,
    },

    /// Look up a single card by name. Quote the name for an exact match.
    Lookup { name: String },

    /// Search cards by free text, newest printing first.
    Search {
        query: String,

        /// Maximum number of distinct cards (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show set, rarity and price of one printing.
    Printing { name: String, set: String },

    /// Report the best OCR reading of every candidate region.
    Regions { image: PathBuf },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = ScanConfig::load(args.config.as_deref());

    // Only image commands need Tesseract
    match args.command {
        Command::Identify { image, resolve } => {
            let bytes = read_image(&image)?;
            if resolve {
                let scanner = CardScanner::from_config(&config)?;
                let (ident, card) = scanner.scan(&bytes)?;
                print_json(&json!({ "identification": ident, "card": card }))?;
            } else {
                let reader = reader_from_config(&config)?;
                print_json(&reader.identify_from_image(&bytes)?)?;
            }
        }
        Command::Regions { image } => {
            let bytes = read_image(&image)?;
            let reader = reader_from_config(&config)?;
            print_json(&reader.diagnose_regions(&bytes)?)?;
        }
        Command::Lookup { name } => {
            let resolver = resolver_from_config(&config)?;
            print_json(&resolver.resolve_one(&name)?)?;
        }
        Command::Search { query, limit } => {
            let limit = limit.unwrap_or(config.scryfall.search_limit);
            let resolver = resolver_from_config(&config)?;
            let cards = resolver.resolve_many(&query, limit)?;
            info!("{} card(s) for '{}'", cards.len(), query);
            print_json(&cards)?;
        }
        Command::Printing { name, set } => {
            let resolver = resolver_from_config(&config)?;
            print_json(&resolver.resolve_at_printing(&name, &set)?)?;
        }
    }

    Ok(())
}
