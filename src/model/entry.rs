use chrono::{Datelike, NaiveDate};

use super::paymode::Paymode;

/// Reconciliation status of a ledger entry (`st` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    None,
    Cleared,
    Reconciled,
}

impl Status {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Status::Cleared,
            2 => Status::Reconciled,
            _ => Status::None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Status::None => 0,
            Status::Cleared => 1,
            Status::Reconciled => 2,
        }
    }
}

/// Bit set stored in the entry's `flags` attribute.
pub const FLAG_INCOME: u32 = 1 << 1;
pub const FLAG_SPLIT: u32 = 1 << 8;

/// One split sub-entry; stored verbatim, amounts are not validated against
/// the parent entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Split {
    pub category: String,
    pub amount: f64,
    pub memo: String,
}

/// A ledger entry, either parsed from the settings document or produced by
/// the conversion pipeline. References to payee, category and accounts are
/// keys into the reference model; `None` when the document referenced
/// something defined later (or not at all).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    pub date: NaiveDate,
    pub amount: f64,
    pub paymode: Paymode,
    pub payee: Option<u32>,
    pub category: Option<u32>,
    pub account: Option<u32>,
    pub destination_account: Option<u32>,
    pub memo: String,
    pub info: String,
    pub tags: Vec<String>,
    pub status: Status,
    pub flags: u32,
    /// Transfer link id; > 0 only on the two mirrored halves of a transfer.
    pub link_id: u32,
    pub splits: Vec<Split>,
}

impl Entry {
    pub fn is_income(&self) -> bool {
        self.flags & FLAG_INCOME != 0
    }
}

/// Day-count encoding used by the document's `date` attribute: days of the
/// proleptic Gregorian calendar, day 719163 being 1970-01-01.
pub fn date_to_day_number(date: NaiveDate) -> u32 {
    date.num_days_from_ce() as u32
}

pub fn day_number_to_date(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(day as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_number_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_day_number(epoch), 719163);
        assert_eq!(day_number_to_date(719163), Some(epoch));
    }

    #[test]
    fn day_number_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(day_number_to_date(date_to_day_number(date)), Some(date));
    }

    #[test]
    fn status_codes_round_trip() {
        for code in 0..=2 {
            assert_eq!(Status::from_code(code).code(), code);
        }
        assert_eq!(Status::from_code(9), Status::None);
    }

    #[test]
    fn income_flag() {
        let mut entry = Entry::default();
        assert!(!entry.is_income());
        entry.flags |= FLAG_INCOME;
        assert!(entry.is_income());
    }
}
