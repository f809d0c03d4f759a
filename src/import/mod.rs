use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::locale::Locale;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(String),
    Parse(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "io error: {e}"),
            ImportError::Csv(e) => write!(f, "csv error: {e}"),
            ImportError::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        ImportError::Csv(e.to_string())
    }
}

/// One raw transaction from a source bank export.
///
/// `value_date` is `None` when the export carried no parseable value date;
/// the conversion pipeline then falls back to the accounting date and marks
/// the entry cleared instead of reconciled.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTransaction {
    pub iban: String,
    pub extraction_number: u32,
    pub accounting_date: NaiveDate,
    pub value_date: Option<NaiveDateTime>,
    pub payment_reference: String,
    pub currency: String,
    pub amount: f64,
    pub accounting_text: String,
    pub memo: String,
}

pub trait StatementReader {
    fn parse(path: &Path, locale: Locale) -> Result<Vec<SourceTransaction>, ImportError>;
}

pub mod hellobank;
