//! Number and date conventions of the supported bank export locales.

use chrono::NaiveDate;

/// Locale used when parsing source exports and formatting CSV output.
///
/// `De` covers the German-speaking exports the converter was written for
/// (`1.234,56`, `31.12.2024`); `Invariant` is plain `1234.56` / ISO dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    De,
    #[default]
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleError(pub String);

impl std::fmt::Display for LocaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value for locale: {}", self.0)
    }
}

impl std::error::Error for LocaleError {}

impl std::str::FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "de" | "de-at" | "de-de" => Ok(Locale::De),
            "invariant" | "c" | "en" => Ok(Locale::Invariant),
            other => Err(LocaleError(other.to_string())),
        }
    }
}

impl Locale {
    /// Parses a decimal amount written with this locale's separators.
    pub fn parse_decimal(&self, text: &str) -> Result<f64, LocaleError> {
        let normalized = match self {
            Locale::De => text.trim().replace('.', "").replace(',', "."),
            Locale::Invariant => text.trim().replace(',', ""),
        };
        normalized
            .parse::<f64>()
            .map_err(|_| LocaleError(text.to_string()))
    }

    /// Formats an amount with this locale's decimal separator.
    pub fn format_decimal(&self, value: f64) -> String {
        let plain = format!("{value}");
        match self {
            Locale::De => plain.replace('.', ","),
            Locale::Invariant => plain,
        }
    }

    /// Parses a calendar date written with this locale's conventions.
    pub fn parse_date(&self, text: &str) -> Result<NaiveDate, LocaleError> {
        let text = text.trim();
        let format = match self {
            Locale::De => "%d.%m.%Y",
            Locale::Invariant => "%Y-%m-%d",
        };
        NaiveDate::parse_from_str(text, format)
            // Either locale accepts the other's form as a fallback; exports
            // from the web portal switched formats at least once.
            .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
            .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
            .map_err(|_| LocaleError(text.to_string()))
    }
}
