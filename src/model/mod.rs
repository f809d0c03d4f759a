//! In-memory reference model built from the ledger settings document.

pub mod account;
pub mod assignment;
pub mod category;
pub mod entry;
pub mod payee;
pub mod paymode;
pub mod tag;

pub use account::{Account, AccountType};
pub use assignment::{Assignment, ConditionField};
pub use category::{Category, CategoryType};
pub use entry::{Entry, FLAG_INCOME, FLAG_SPLIT, Split, Status};
pub use payee::Payee;
pub use paymode::{Paymode, PaymodeMatch, PaymodePattern, PaymodePatternSet};
pub use tag::Tag;

use regex::Regex;

/// Everything the conversion pipeline needs to know about the target ledger:
/// the entity collections of the settings document, the resolved target
/// account and the running transfer-link counter.
///
/// The collections are read-only during a conversion run, except for `tags`
/// (new tags may be appended) and `max_link_id` (monotonically incremented).
#[derive(Debug, Default)]
pub struct Ledger {
    pub accounts: Vec<Account>,
    pub payees: Vec<Payee>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub assignments: Vec<Assignment>,
    pub paymode_sets: Vec<PaymodePatternSet>,
    pub existing: Vec<Entry>,
    pub target_account: Option<u32>,
    pub max_link_id: u32,
}

impl Ledger {
    pub fn account(&self, key: u32) -> Option<&Account> {
        self.accounts.iter().find(|a| a.key == key)
    }

    pub fn payee(&self, key: u32) -> Option<&Payee> {
        self.payees.iter().find(|p| p.key == key)
    }

    pub fn category(&self, key: u32) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Renders a category as `Parent:Child` when it is a subcategory.
    pub fn category_full_name(&self, key: u32) -> String {
        match self.category(key) {
            Some(cat) => match cat.parent.and_then(|p| self.category(p)) {
                Some(parent) => format!("{}:{}", parent.name, cat.name),
                None => cat.name.clone(),
            },
            None => String::new(),
        }
    }

    /// First account whose name matches the pattern, in document order.
    pub fn find_account(&self, pattern: &Regex) -> Option<u32> {
        self.accounts
            .iter()
            .find(|a| pattern.is_match(&a.name))
            .map(|a| a.key)
    }

    /// Resolves free text to a payee/category pair via the assignment rules.
    pub fn resolve_assignment(&self, text: &str) -> Option<&Assignment> {
        assignment::resolve(&self.assignments, text)
    }

    /// Resolves an entry's accounting text and memo to a paymode.
    pub fn resolve_paymode(&self, accounting_text: &str, memo: &str) -> PaymodeMatch {
        paymode::resolve(&self.paymode_sets, accounting_text, memo)
    }

    /// Allocates the next transfer link id.
    pub fn next_link_id(&mut self) -> u32 {
        self.max_link_id += 1;
        self.max_link_id
    }

    /// Looks a tag up by exact name, allocating it with the next unused key
    /// when absent. New tags are visible to later conversions of the batch.
    pub fn ensure_tag(&mut self, name: &str) {
        if self.tags.iter().any(|t| t.name == name) {
            return;
        }
        let key = self.tags.iter().map(|t| t.key).max().unwrap_or(0) + 1;
        self.tags.push(Tag::new(key, name));
    }

    /// Tags allocated during conversion, in allocation order.
    pub fn new_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| !t.from_document)
    }
}
