use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use homebank_import::convert::convert_batch;
use homebank_import::dedup;
use homebank_import::document::{self, Document, DocumentError};
use homebank_import::export::{self, report};
use homebank_import::import::hellobank;
use homebank_import::locale::Locale;

#[derive(Serialize, Deserialize, Default)]
struct Config {
    defaults: Defaults,
}

#[derive(Serialize, Deserialize, Default)]
struct Defaults {
    locale: Option<String>,
    account_pattern: Option<String>,
    patterns: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "homebank-import",
    about = "Convert Hello Bank CSV exports into a HomeBank ledger"
)]
struct Cli {
    /// Source bank export (CSV)
    #[arg(long)]
    input: PathBuf,
    /// HomeBank settings document (.xhb) providing the reference data
    #[arg(long)]
    ledger: PathBuf,
    /// Output file; the extension selects the target format (.xhb or .csv)
    #[arg(long)]
    output: PathBuf,
    /// Paymode pattern rules file
    #[arg(long)]
    patterns: Option<PathBuf>,
    /// Regex selecting the target account by name
    #[arg(long)]
    account_pattern: Option<String>,
    /// Locale of the source export (de or invariant)
    #[arg(long)]
    locale: Option<String>,
    /// Configuration file with defaults
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Debug)]
enum CliError {
    InvalidConfig(String),
    UnsupportedTarget(String),
    Duplicates(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            CliError::UnsupportedTarget(ext) => {
                write!(f, "unsupported target format: {ext:?} (expected .xhb or .csv)")
            }
            CliError::Duplicates(count) => write!(
                f,
                "{count} entries were rejected as duplicates; see the .duplicates.csv/.txt files"
            ),
        }
    }
}

impl std::error::Error for CliError {}

fn load_config(path: &Path) -> Result<Config, CliError> {
    let Ok(data) = fs::read_to_string(path) else {
        return Ok(Config::default());
    };
    toml::from_str(&data).map_err(|e| CliError::InvalidConfig(e.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let locale: Locale = cli
        .locale
        .or(config.defaults.locale)
        .as_deref()
        .unwrap_or("invariant")
        .parse()?;
    let account_pattern = cli.account_pattern.or(config.defaults.account_pattern);
    let patterns = cli.patterns.or(config.defaults.patterns);

    let sources = hellobank::parse(&cli.input, locale)?;
    let mut doc = Document::open(&cli.ledger)?;
    let mut ledger = doc.build_ledger(account_pattern.as_deref())?;
    if let Some(path) = &patterns {
        document::load_paymode_patterns(path, &mut ledger)?;
    }

    let extension = cli
        .output
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let entries = convert_batch(&sources, &mut ledger);
    let result = dedup::partition(entries, &ledger.existing);

    match extension.as_str() {
        "xhb" => {
            if ledger.target_account.is_none() {
                return Err(Box::new(DocumentError::NoTargetAccount(
                    account_pattern.unwrap_or_default(),
                )));
            }
            let new_tags: Vec<_> = ledger.new_tags().cloned().collect();
            doc.merge(&result.accepted, &new_tags);
            doc.save(&cli.output)?;
        }
        "csv" => {
            export::write_csv(&cli.output, &result.accepted, &ledger, locale)?;
        }
        other => return Err(Box::new(CliError::UnsupportedTarget(other.to_string()))),
    }
    info!(
        accepted = result.accepted.len(),
        output = %cli.output.display(),
        "conversion finished"
    );

    if !result.duplicates.is_empty() {
        let paths = report::write_report(&cli.output, &result.duplicates, &ledger, locale)?;
        eprintln!(
            "{} duplicate entries were not merged; reports written to {} and {}",
            result.duplicates.len(),
            paths.csv.display(),
            paths.text.display()
        );
        return Err(Box::new(CliError::Duplicates(result.duplicates.len())));
    }
    Ok(())
}
