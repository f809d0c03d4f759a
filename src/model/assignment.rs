use regex::{Regex, RegexBuilder};

/// Which transaction field an assignment is meant to match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionField {
    #[default]
    PostingText,
    Payee,
}

impl ConditionField {
    pub fn from_code(code: u32) -> Self {
        if code == 1 {
            ConditionField::Payee
        } else {
            ConditionField::PostingText
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConditionField::PostingText => "posting text",
            ConditionField::Payee => "payee",
        }
    }
}

/// A rule mapping matched free text to a payee/category pair.
///
/// The rule's name doubles as its pattern: spaces become a permissive `.*`
/// wildcard, so an assignment named `Grocery Mart` also matches
/// `Grocery ... Mart ...`. The regex is compiled once when the rule is
/// parsed and reused for every transaction of the batch.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub key: u32,
    pub name: String,
    pub ignore_case: bool,
    pub field: ConditionField,
    pub payee: Option<u32>,
    pub category: Option<u32>,
    pattern: Regex,
}

impl Assignment {
    pub fn new(
        key: u32,
        name: String,
        ignore_case: bool,
        field: ConditionField,
        payee: Option<u32>,
        category: Option<u32>,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&name.replace(' ', ".*"))
            .case_insensitive(ignore_case)
            .build()?;
        Ok(Assignment {
            key,
            name,
            ignore_case,
            field,
            payee,
            category,
            pattern,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Resolves free text to the payee/category of the first matching
/// assignment, in document order. No match is not an error.
pub fn resolve<'a>(assignments: &'a [Assignment], text: &str) -> Option<&'a Assignment> {
    assignments.iter().find(|asg| asg.matches(text))
}
