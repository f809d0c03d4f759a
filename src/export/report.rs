//! Side-channel report for entries rejected as duplicates.
//!
//! Two artifacts are derived from the target file's base name: a CSV with
//! the same columns as the primary export, and a plain-text dump with one
//! field per line, meant for manual reconciliation.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::WriterBuilder;
use tracing::warn;

use super::{CSV_HEADER, ExportError, entry_record};
use crate::locale::Locale;
use crate::model::{Entry, Ledger};

/// Paths of the written artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub text: PathBuf,
}

pub fn report_paths(target: &Path) -> ReportPaths {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    ReportPaths {
        csv: dir.join(format!("{stem}.duplicates.csv")),
        text: dir.join(format!("{stem}.duplicates.txt")),
    }
}

/// Writes both duplicate artifacts next to the target file.
pub fn write_report(
    target: &Path,
    duplicates: &[Entry],
    ledger: &Ledger,
    locale: Locale,
) -> Result<ReportPaths, ExportError> {
    let paths = report_paths(target);

    let mut writer = WriterBuilder::new().delimiter(b';').from_path(&paths.csv)?;
    writer.write_record(CSV_HEADER)?;
    for entry in duplicates {
        writer.write_record(entry_record(entry, ledger, locale))?;
    }
    writer.flush()?;

    std::fs::write(&paths.text, render_text(duplicates, ledger, locale))?;
    warn!(
        count = duplicates.len(),
        csv = %paths.csv.display(),
        text = %paths.text.display(),
        "duplicate entries rejected"
    );
    Ok(paths)
}

fn render_text(duplicates: &[Entry], ledger: &Ledger, locale: Locale) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Rejected duplicate entries ({})",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for (index, entry) in duplicates.iter().enumerate() {
        let _ = writeln!(out, "\n[{}]", index + 1);
        let _ = writeln!(out, "{}", render_entry(entry, ledger, locale));
    }
    out
}

/// One field per line, resolved against the reference model.
pub fn render_entry(entry: &Entry, ledger: &Ledger, locale: Locale) -> String {
    let name_of_account = |key: Option<u32>| {
        key.and_then(|k| ledger.account(k))
            .map(|a| a.name.clone())
            .unwrap_or_default()
    };
    let mut out = String::new();
    let _ = writeln!(out, "  date:        {}", entry.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "  amount:      {}", locale.format_decimal(entry.amount));
    let _ = writeln!(out, "  paymode:     {}", entry.paymode.label());
    let _ = writeln!(out, "  memo:        {}", entry.memo);
    let _ = writeln!(out, "  info:        {}", entry.info);
    let _ = writeln!(out, "  tags:        {}", entry.tags.join(" "));
    let _ = writeln!(
        out,
        "  payee:       {}",
        entry
            .payee
            .and_then(|k| ledger.payee(k))
            .map(|p| p.name.clone())
            .unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "  category:    {}",
        entry
            .category
            .map(|k| ledger.category_full_name(k))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "  account:     {}", name_of_account(entry.account));
    let _ = write!(
        out,
        "  destination: {}",
        name_of_account(entry.destination_account)
    );
    out
}
