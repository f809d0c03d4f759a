//! Conversion of source transactions into ledger entries.

use tracing::{debug, info};

use crate::import::SourceTransaction;
use crate::model::{Entry, FLAG_INCOME, FLAG_SPLIT, Ledger, Paymode, Status};

/// Converts one source transaction into one ledger entry, or two for an
/// inter-account transfer (the original plus its mirror).
///
/// The ledger is the read-only reference context, except that new tags may
/// be appended and the transfer-link counter advanced; both effects are
/// visible to later conversions of the same batch.
pub fn convert(source: &SourceTransaction, ledger: &mut Ledger) -> Vec<Entry> {
    let mut entry = Entry {
        date: source
            .value_date
            .map(|d| d.date())
            .unwrap_or(source.accounting_date),
        amount: source.amount,
        account: ledger.target_account,
        status: if source.value_date.is_some() {
            Status::Reconciled
        } else {
            Status::Cleared
        },
        ..Entry::default()
    };
    if entry.amount >= 0.0 {
        entry.flags |= FLAG_INCOME;
    }

    if let Some(assignment) = ledger.resolve_assignment(&source.memo) {
        entry.payee = assignment.payee;
        entry.category = assignment.category;
    }

    entry.memo = if source.payment_reference.is_empty() {
        source.memo.clone()
    } else {
        format!("[Ref: {}] {}", source.payment_reference, source.memo)
    };
    entry.info = source.accounting_text.clone();

    // Memo and info are match inputs, so they must be composed before the
    // paymode is resolved.
    let matched = ledger.resolve_paymode(&entry.info, &entry.memo);
    entry.paymode = matched.paymode;

    let mut mirror = None;
    if entry.paymode == Paymode::BetweenAccounts {
        entry.link_id = ledger.next_link_id();
        entry.flags |= FLAG_SPLIT;
        if let Some(pattern) = &matched.destination_account {
            entry.destination_account = ledger.find_account(pattern);
        }
        debug!(
            link_id = entry.link_id,
            destination = ?entry.destination_account,
            "transfer detected"
        );
    }

    if let Some(tag_string) = &matched.tags {
        for name in tag_string.split_whitespace() {
            ledger.ensure_tag(name);
            entry.tags.push(name.to_string());
        }
    }

    if entry.paymode == Paymode::BetweenAccounts {
        mirror = Some(mirror_of(&entry));
    }

    match mirror {
        Some(m) => vec![entry, m],
        None => vec![entry],
    }
}

/// The second half of a transfer: negated amount, swapped accounts, same
/// link id, income flag recomputed from the negated sign.
fn mirror_of(entry: &Entry) -> Entry {
    let mut mirror = entry.clone();
    mirror.amount = -entry.amount;
    mirror.account = entry.destination_account;
    mirror.destination_account = entry.account;
    mirror.flags &= !FLAG_INCOME;
    if mirror.amount >= 0.0 {
        mirror.flags |= FLAG_INCOME;
    }
    mirror
}

/// Converts a whole batch, preserving source order.
pub fn convert_batch(sources: &[SourceTransaction], ledger: &mut Ledger) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(sources.len());
    for source in sources {
        entries.extend(convert(source, ledger));
    }
    info!(
        sources = sources.len(),
        entries = entries.len(),
        "batch converted"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Assignment, Category, ConditionField, Payee, PaymodePattern,
        PaymodePatternSet, Tag};
    use chrono::{NaiveDate, NaiveDateTime};

    fn source(amount: f64, accounting_text: &str, memo: &str) -> SourceTransaction {
        SourceTransaction {
            iban: "AT61".into(),
            extraction_number: 1,
            accounting_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            value_date: Some(
                NaiveDateTime::parse_from_str("2024-03-01 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            payment_reference: String::new(),
            currency: "EUR".into(),
            amount,
            accounting_text: accounting_text.into(),
            memo: memo.into(),
        }
    }

    fn ledger_with_assignment() -> Ledger {
        let mut ledger = Ledger::default();
        ledger.accounts.push(Account {
            key: 1,
            name: "Checking".into(),
            ..Account::default()
        });
        ledger.accounts.push(Account {
            key: 2,
            name: "Savings".into(),
            ..Account::default()
        });
        ledger.payees.push(Payee {
            key: 1,
            name: "Grocery Mart".into(),
        });
        ledger.categories.push(Category {
            key: 1,
            name: "Groceries".into(),
            ..Category::default()
        });
        ledger.assignments.push(
            Assignment::new(
                1,
                "Grocery Mart".into(),
                false,
                ConditionField::PostingText,
                Some(1),
                Some(1),
            )
            .unwrap(),
        );
        ledger.target_account = Some(1);
        ledger
    }

    fn pattern_set(paymode: Paymode, pattern: PaymodePattern) -> PaymodePatternSet {
        PaymodePatternSet {
            paymode,
            patterns: vec![pattern],
        }
    }

    #[test]
    fn assignment_resolves_payee_and_category() {
        let mut ledger = ledger_with_assignment();
        let entries = convert(&source(-25.5, "SEPA credit transfer", "Grocery Mart"), &mut ledger);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(entry.amount, -25.5);
        assert_eq!(entry.payee, Some(1));
        assert_eq!(entry.category, Some(1));
        assert_eq!(entry.paymode, Paymode::Unknown);
        assert_eq!(entry.info, "SEPA credit transfer");
        assert_eq!(entry.account, Some(1));
        assert_eq!(entry.status, Status::Reconciled);
        assert!(!entry.is_income());
    }

    #[test]
    fn level_two_pattern_sets_the_paymode() {
        let mut ledger = ledger_with_assignment();
        ledger.paymode_sets.push(pattern_set(
            Paymode::DebitCard,
            PaymodePattern::new("SEPA credit transfer", None, None, None).unwrap(),
        ));
        let entries = convert(&source(-25.5, "SEPA credit transfer", "Grocery Mart"), &mut ledger);
        assert_eq!(entries[0].paymode, Paymode::DebitCard);
    }

    #[test]
    fn payment_reference_prefixes_the_memo() {
        let mut ledger = ledger_with_assignment();
        let mut src = source(-10.0, "Transfer", "Rent march");
        src.payment_reference = "RF-2024-03".into();
        let entries = convert(&src, &mut ledger);
        assert_eq!(entries[0].memo, "[Ref: RF-2024-03] Rent march");
    }

    #[test]
    fn missing_value_date_falls_back_to_cleared() {
        let mut ledger = ledger_with_assignment();
        let mut src = source(-10.0, "Transfer", "x");
        src.value_date = None;
        let entries = convert(&src, &mut ledger);
        assert_eq!(entries[0].status, Status::Cleared);
        assert_eq!(entries[0].date, src.accounting_date);
    }

    #[test]
    fn income_flag_follows_the_sign() {
        let mut ledger = ledger_with_assignment();
        assert!(convert(&source(100.0, "Deposit", "pay"), &mut ledger)[0].is_income());
        assert!(!convert(&source(-1.0, "POS", "shop"), &mut ledger)[0].is_income());
    }

    #[test]
    fn transfer_produces_a_linked_mirror_pair() {
        let mut ledger = ledger_with_assignment();
        ledger.max_link_id = 4;
        ledger.paymode_sets.push(pattern_set(
            Paymode::BetweenAccounts,
            PaymodePattern::new("Own transfer", None, Some("Savings"), None).unwrap(),
        ));
        let entries = convert(&source(-200.0, "Own transfer", "monthly saving"), &mut ledger);
        assert_eq!(entries.len(), 2);
        let (original, mirror) = (&entries[0], &entries[1]);
        assert_eq!(original.link_id, 5);
        assert_eq!(mirror.link_id, 5);
        assert_eq!(mirror.amount, 200.0);
        assert_eq!(original.account, Some(1));
        assert_eq!(original.destination_account, Some(2));
        assert_eq!(mirror.account, Some(2));
        assert_eq!(mirror.destination_account, Some(1));
        assert!(original.flags & FLAG_SPLIT != 0);
        assert!(mirror.flags & FLAG_SPLIT != 0);
        assert!(!original.is_income());
        assert!(mirror.is_income());
        assert_eq!(ledger.max_link_id, 5);
    }

    #[test]
    fn transfer_without_destination_match_leaves_it_empty() {
        let mut ledger = ledger_with_assignment();
        ledger.paymode_sets.push(pattern_set(
            Paymode::BetweenAccounts,
            PaymodePattern::new("Own transfer", None, Some("Broker"), None).unwrap(),
        ));
        let entries = convert(&source(-50.0, "Own transfer", "x"), &mut ledger);
        assert_eq!(entries[0].destination_account, None);
        assert!(entries[0].link_id > 0);
    }

    #[test]
    fn pattern_tags_are_allocated_once_across_the_batch() {
        let mut ledger = ledger_with_assignment();
        ledger.tags.push(Tag {
            key: 9,
            name: "fixed".into(),
            from_document: true,
        });
        ledger.paymode_sets.push(pattern_set(
            Paymode::StandingOrder,
            PaymodePattern::new("Standing order", None, None, Some("fixed rent".into())).unwrap(),
        ));
        let sources = vec![
            source(-700.0, "Standing order", "rent march"),
            source(-700.0, "Standing order", "rent april"),
        ];
        let entries = convert_batch(&sources, &mut ledger);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tags, vec!["fixed", "rent"]);
        assert_eq!(entries[1].tags, vec!["fixed", "rent"]);
        // "fixed" already existed; only "rent" was allocated, with key 10.
        let new: Vec<_> = ledger.new_tags().collect();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].key, 10);
        assert_eq!(new[0].name, "rent");
    }
}
