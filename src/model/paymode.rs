use regex::{Regex, RegexBuilder};

/// Payment modes known to HomeBank, with their integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paymode {
    #[default]
    Unknown,
    CreditCard,
    Check,
    Cash,
    Transfer,
    BetweenAccounts,
    DebitCard,
    StandingOrder,
    ElectronicPayment,
    Deposit,
    FiFee,
    Debit,
}

impl Paymode {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Paymode::CreditCard,
            2 => Paymode::Check,
            3 => Paymode::Cash,
            4 => Paymode::Transfer,
            5 => Paymode::BetweenAccounts,
            6 => Paymode::DebitCard,
            7 => Paymode::StandingOrder,
            8 => Paymode::ElectronicPayment,
            9 => Paymode::Deposit,
            10 => Paymode::FiFee,
            11 => Paymode::Debit,
            _ => Paymode::Unknown,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Paymode::Unknown => 0,
            Paymode::CreditCard => 1,
            Paymode::Check => 2,
            Paymode::Cash => 3,
            Paymode::Transfer => 4,
            Paymode::BetweenAccounts => 5,
            Paymode::DebitCard => 6,
            Paymode::StandingOrder => 7,
            Paymode::ElectronicPayment => 8,
            Paymode::Deposit => 9,
            Paymode::FiFee => 10,
            Paymode::Debit => 11,
        }
    }

    /// Name used by the pattern rules file's `type` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            Paymode::Unknown => "Unknown",
            Paymode::CreditCard => "CreditCard",
            Paymode::Check => "Check",
            Paymode::Cash => "Cash",
            Paymode::Transfer => "Transfer",
            Paymode::BetweenAccounts => "BetweenAccounts",
            Paymode::DebitCard => "DebitCard",
            Paymode::StandingOrder => "StandingOrder",
            Paymode::ElectronicPayment => "ElectronicPayment",
            Paymode::Deposit => "Deposit",
            Paymode::FiFee => "FiFee",
            Paymode::Debit => "Debit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [Paymode; 12] = [
            Paymode::Unknown,
            Paymode::CreditCard,
            Paymode::Check,
            Paymode::Cash,
            Paymode::Transfer,
            Paymode::BetweenAccounts,
            Paymode::DebitCard,
            Paymode::StandingOrder,
            Paymode::ElectronicPayment,
            Paymode::Deposit,
            Paymode::FiFee,
            Paymode::Debit,
        ];
        ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Paymode::Unknown => "unknown",
            Paymode::CreditCard => "credit card",
            Paymode::Check => "check",
            Paymode::Cash => "cash",
            Paymode::Transfer => "transfer",
            Paymode::BetweenAccounts => "between accounts",
            Paymode::DebitCard => "debit card",
            Paymode::StandingOrder => "standing order",
            Paymode::ElectronicPayment => "electronic payment",
            Paymode::Deposit => "deposit",
            Paymode::FiFee => "financial institution fee",
            Paymode::Debit => "debit",
        }
    }
}

/// One pattern of a paymode rule block.
///
/// Level 1 patterns carry a memo regex and require both the accounting text
/// and the memo to match; level 2 patterns match on accounting text alone.
/// All matching is case-insensitive, mirroring how banks vary the casing of
/// their posting texts.
#[derive(Debug, Clone)]
pub struct PaymodePattern {
    pub level: u32,
    pub accounting_text: Regex,
    pub memo: Option<Regex>,
    pub destination_account: Option<Regex>,
    pub tags: Option<String>,
}

impl PaymodePattern {
    pub fn new(
        accounting_text: &str,
        memo: Option<&str>,
        destination_account: Option<&str>,
        tags: Option<String>,
    ) -> Result<Self, regex::Error> {
        let ci = |pat: &str| RegexBuilder::new(pat).case_insensitive(true).build();
        Ok(PaymodePattern {
            level: if memo.is_some() { 1 } else { 2 },
            accounting_text: ci(accounting_text)?,
            memo: memo.map(ci).transpose()?,
            destination_account: destination_account.map(Regex::new).transpose()?,
            tags,
        })
    }

    pub fn matches(&self, accounting_text: &str, memo: &str) -> bool {
        if !self.accounting_text.is_match(accounting_text) {
            return false;
        }
        match &self.memo {
            Some(pattern) => pattern.is_match(memo),
            None => true,
        }
    }
}

/// All patterns mapping onto one paymode.
#[derive(Debug, Clone)]
pub struct PaymodePatternSet {
    pub paymode: Paymode,
    pub patterns: Vec<PaymodePattern>,
}

impl PaymodePatternSet {
    /// Level of the set's most specific pattern, used to order sets so that
    /// precise level-1 rules are tried before generic level-2 ones.
    pub fn specificity(&self) -> u32 {
        self.patterns.first().map(|p| p.level).unwrap_or(u32::MAX)
    }

    /// Sorts patterns by ascending level; called once after parsing.
    pub fn sort_patterns(&mut self) {
        self.patterns.sort_by_key(|p| p.level);
    }
}

/// Result of a paymode resolution.
#[derive(Debug, Clone, Default)]
pub struct PaymodeMatch {
    pub paymode: Paymode,
    pub destination_account: Option<Regex>,
    pub tags: Option<String>,
}

/// Finds the paymode for an entry's accounting text and memo.
///
/// The first matching pattern within the first matching set decides; sets and
/// patterns are pre-ordered by specificity. No match resolves to
/// [`Paymode::Unknown`] with no destination and no tags.
pub fn resolve(sets: &[PaymodePatternSet], accounting_text: &str, memo: &str) -> PaymodeMatch {
    for set in sets {
        if let Some(pattern) = set
            .patterns
            .iter()
            .find(|p| p.matches(accounting_text, memo))
        {
            return PaymodeMatch {
                paymode: set.paymode,
                destination_account: pattern.destination_account.clone(),
                tags: pattern.tags.clone(),
            };
        }
    }
    PaymodeMatch::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paymode: Paymode, patterns: Vec<PaymodePattern>) -> PaymodePatternSet {
        let mut set = PaymodePatternSet { paymode, patterns };
        set.sort_patterns();
        set
    }

    #[test]
    fn paymode_codes_round_trip() {
        for code in 0..=11 {
            assert_eq!(Paymode::from_code(code).code(), code);
        }
        assert_eq!(Paymode::from_code(42), Paymode::Unknown);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(Paymode::from_name("DebitCard"), Some(Paymode::DebitCard));
        assert_eq!(Paymode::from_name("debitcard"), None);
    }

    #[test]
    fn level_two_matches_on_accounting_text_alone() {
        let sets = vec![set(
            Paymode::DebitCard,
            vec![PaymodePattern::new("POS purchase", None, None, None).unwrap()],
        )];
        let hit = resolve(&sets, "pos purchase 1234", "anything");
        assert_eq!(hit.paymode, Paymode::DebitCard);
    }

    #[test]
    fn level_one_requires_the_memo_too() {
        let pattern =
            PaymodePattern::new("transfer", Some("standing order"), None, None).unwrap();
        assert_eq!(pattern.level, 1);
        assert!(pattern.matches("SEPA Transfer", "Standing order rent"));
        assert!(!pattern.matches("SEPA Transfer", "one-off payment"));
    }

    #[test]
    fn specific_set_wins_over_generic_one() {
        let mut sets = vec![
            set(
                Paymode::Transfer,
                vec![PaymodePattern::new("transfer", None, None, None).unwrap()],
            ),
            set(
                Paymode::StandingOrder,
                vec![PaymodePattern::new("transfer", Some("rent"), None, None).unwrap()],
            ),
        ];
        sets.sort_by_key(|s| s.specificity());
        let hit = resolve(&sets, "SEPA transfer", "rent march");
        assert_eq!(hit.paymode, Paymode::StandingOrder);
    }

    #[test]
    fn no_match_resolves_to_unknown() {
        let sets = vec![set(
            Paymode::Cash,
            vec![PaymodePattern::new("ATM", None, None, None).unwrap()],
        )];
        let hit = resolve(&sets, "SEPA credit transfer", "memo");
        assert_eq!(hit.paymode, Paymode::Unknown);
        assert!(hit.destination_account.is_none());
        assert!(hit.tags.is_none());
    }
}
