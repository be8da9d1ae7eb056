mod commands;

use std::io::stderr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hogar",
    version,
    about = "Turn bank CSV exports into categorized, validated transactions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected delimiter, date layout and column mapping.
    Sniff {
        /// Bank export to inspect
        file: PathBuf,
        /// Field delimiter (`tab` for tab-separated files)
        #[arg(long, value_parser = parse_delimiter)]
        delimiter: Option<char>,
        /// Import settings (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Normalize, categorize, validate and check a file for duplicates.
    Import {
        /// Bank export to import
        file: PathBuf,
        /// Field delimiter (`tab` for tab-separated files)
        #[arg(long, value_parser = parse_delimiter)]
        delimiter: Option<char>,
        /// Import settings (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON array of `{id, name, subCategories}`
        #[arg(long)]
        categories: Option<PathBuf>,
        /// JSON array of already stored transactions
        #[arg(long)]
        existing: Option<PathBuf>,
        /// Current account balance
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        balance: f64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

fn parse_delimiter(raw: &str) -> Result<char, String> {
    match raw {
        "tab" | "\\t" | "\t" => Ok('\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => Err(format!("expected a single ASCII character, got '{raw}'")),
            }
        }
    }
}

fn setup_logging() {
    // stdout carries the report, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(stderr)
        .init();
}

fn main() {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sniff {
            file,
            delimiter,
            config,
        } => commands::sniff(&file, delimiter, config.as_deref()),
        Commands::Import {
            file,
            delimiter,
            config,
            categories,
            existing,
            balance,
            format,
        } => commands::import(commands::ImportArgs {
            file: &file,
            delimiter,
            config: config.as_deref(),
            categories: categories.as_deref(),
            existing: existing.as_deref(),
            balance,
            format,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
