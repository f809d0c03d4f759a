//! Writing converted entries as a HomeBank CSV import file.

use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::locale::Locale;
use crate::model::{Entry, Ledger};

pub mod report;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "io error: {e}"),
            ExportError::Csv(e) => write!(f, "csv error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e.to_string())
    }
}

pub const CSV_HEADER: [&str; 8] = [
    "date", "paymode", "info", "payee", "memo", "amount", "category", "tags",
];

/// Writes entries in HomeBank's CSV import shape, `;`-delimited.
pub fn write_csv(
    path: &Path,
    entries: &[Entry],
    ledger: &Ledger,
    locale: Locale,
) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().delimiter(b';').from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        writer.write_record(entry_record(entry, ledger, locale))?;
    }
    writer.flush()?;
    info!(path = %path.display(), entries = entries.len(), "csv export written");
    Ok(())
}

pub(crate) fn entry_record(entry: &Entry, ledger: &Ledger, locale: Locale) -> [String; 8] {
    [
        entry.date.format("%d-%m-%y").to_string(),
        entry.paymode.code().to_string(),
        entry.info.clone(),
        entry
            .payee
            .and_then(|key| ledger.payee(key))
            .map(|p| p.name.clone())
            .unwrap_or_default(),
        entry.memo.clone(),
        locale.format_decimal(entry.amount),
        entry
            .category
            .map(|key| ledger.category_full_name(key))
            .unwrap_or_default(),
        entry.tags.join(" "),
    ]
}
