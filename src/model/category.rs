/// Category kind as encoded by the document's `flags` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryType {
    #[default]
    Unknown,
    Expense,
    Income,
}

impl CategoryType {
    pub fn from_flags(flags: u32) -> Self {
        match flags {
            1 => CategoryType::Expense,
            3 => CategoryType::Income,
            _ => CategoryType::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryType::Unknown => "unknown",
            CategoryType::Expense => "expense",
            CategoryType::Income => "income",
        }
    }
}

/// A category defined in the ledger document.
///
/// Parents are stored by key, not by reference; the document guarantees that
/// a parent category precedes its children, so the key is resolved against
/// the categories parsed so far. The tree is at most one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    pub key: u32,
    pub name: String,
    pub category_type: CategoryType,
    pub parent: Option<u32>,
}

impl Category {
    pub fn is_subcategory(&self) -> bool {
        self.parent.is_some()
    }
}
