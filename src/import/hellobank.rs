//! Reader for Hello Bank account statement exports.
//!
//! The export is a `;`-delimited CSV with a header row and a fixed column
//! order: IBAN, extraction number, accounting date, an unused column, value
//! date, payment reference, currency, amount (locale decimal), accounting
//! text and memo.

use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::{ImportError, SourceTransaction, StatementReader};
use crate::locale::Locale;

const VALUE_DATE_FORMAT: &str = "%Y-%m-%d-%H.%M.%S%.f";

pub struct HelloBankReader;

impl HelloBankReader {
    fn parse_internal(path: &Path, locale: Locale) -> Result<Vec<SourceTransaction>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut transactions = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            transactions.push(Self::parse_record(&record, locale)?);
        }
        debug!(count = transactions.len(), "source export read");
        Ok(transactions)
    }

    fn parse_record(
        record: &StringRecord,
        locale: Locale,
    ) -> Result<SourceTransaction, ImportError> {
        let field = |index: usize| record.get(index).unwrap_or("");

        let extraction_number = field(1)
            .parse::<u32>()
            .map_err(|_| ImportError::Parse(format!("bad extraction number {:?}", field(1))))?;
        let accounting_date = locale
            .parse_date(field(2))
            .map_err(|e| ImportError::Parse(e.to_string()))?;
        // An unparseable value date is not an error; the entry will simply
        // not be marked reconciled.
        let value_date = NaiveDateTime::parse_from_str(field(4), VALUE_DATE_FORMAT).ok();
        let amount = locale
            .parse_decimal(field(7))
            .map_err(|e| ImportError::Parse(e.to_string()))?;

        Ok(SourceTransaction {
            iban: field(0).to_string(),
            extraction_number,
            accounting_date,
            value_date,
            payment_reference: field(5).to_string(),
            currency: field(6).to_string(),
            amount,
            accounting_text: field(8).to_string(),
            memo: field(9).to_string(),
        })
    }
}

impl StatementReader for HelloBankReader {
    fn parse(path: &Path, locale: Locale) -> Result<Vec<SourceTransaction>, ImportError> {
        Self::parse_internal(path, locale)
    }
}

pub fn parse(path: &Path, locale: Locale) -> Result<Vec<SourceTransaction>, ImportError> {
    HelloBankReader::parse(path, locale)
}
