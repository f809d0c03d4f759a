//! Reading and writing the HomeBank settings document.
//!
//! The document is kept as an XML element tree so that merging new entries
//! preserves everything the converter does not understand; the typed
//! reference model is built from a single forward scan over that tree.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use tracing::debug;
use xmltree::{Element, XMLNode};

use crate::model::{
    Account, AccountType, Assignment, Category, CategoryType, ConditionField, Entry, Ledger,
    Payee, Paymode, PaymodePattern, PaymodePatternSet, Split, Status, Tag, entry,
};

pub mod merge;

#[derive(Debug)]
pub enum DocumentError {
    Io(std::io::Error),
    Xml(xmltree::ParseError),
    /// A recognized element carried an attribute the parser could not read.
    Attribute {
        element: String,
        attribute: String,
        value: String,
    },
    /// An assignment name, paymode pattern or account pattern failed to
    /// compile as a regular expression.
    Pattern(String),
    /// Ledger output was requested but the target-account pattern matched
    /// no account (or none was supplied).
    NoTargetAccount(String),
    Write(String),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::Io(e) => write!(f, "io error: {e}"),
            DocumentError::Xml(e) => write!(f, "xml error: {e}"),
            DocumentError::Attribute {
                element,
                attribute,
                value,
            } => write!(f, "invalid attribute {attribute}={value:?} on <{element}>"),
            DocumentError::Pattern(e) => write!(f, "invalid pattern: {e}"),
            DocumentError::NoTargetAccount(pattern) => {
                write!(f, "no account matches the target pattern {pattern:?}")
            }
            DocumentError::Write(e) => write!(f, "write error: {e}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Io(e) => Some(e),
            DocumentError::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::Io(e)
    }
}

impl From<xmltree::ParseError> for DocumentError {
    fn from(e: xmltree::ParseError) -> Self {
        DocumentError::Xml(e)
    }
}

/// A settings document held as an element tree.
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let file = File::open(path)?;
        let root = Element::parse(BufReader::new(file))?;
        Ok(Document { root })
    }

    pub fn parse_str(input: &str) -> Result<Self, DocumentError> {
        let root = Element::parse(input.as_bytes())?;
        Ok(Document { root })
    }

    /// Builds the reference model from a single forward scan.
    ///
    /// Cross references (category parent, assignment payee/category, entry
    /// payee/category/account) resolve against collections populated earlier
    /// in document order; a forward reference that cannot be resolved is
    /// dropped silently, matching the document convention that parents
    /// precede children. Unrecognized elements are skipped.
    pub fn build_ledger(&self, account_pattern: Option<&str>) -> Result<Ledger, DocumentError> {
        let mut ledger = Ledger::default();

        for element in self.root.children.iter().filter_map(XMLNode::as_element) {
            match element.name.as_str() {
                "account" => ledger.accounts.push(parse_account(element)?),
                "pay" => ledger.payees.push(parse_payee(element)?),
                "cat" => {
                    let category = parse_category(element, &ledger.categories)?;
                    ledger.categories.push(category);
                }
                "tag" => ledger.tags.push(parse_tag(element)?),
                "asg" => {
                    let assignment = parse_assignment(element, &ledger)?;
                    ledger.assignments.push(assignment);
                }
                "ope" => {
                    let entry = parse_entry(element, &ledger)?;
                    ledger.existing.push(entry);
                }
                _ => {}
            }
        }

        if let Some(pattern) = account_pattern {
            let regex = compile_account_pattern(pattern)?;
            ledger.target_account = ledger.find_account(&regex);
        }
        ledger.max_link_id = ledger.existing.iter().map(|e| e.link_id).max().unwrap_or(0);

        debug!(
            accounts = ledger.accounts.len(),
            payees = ledger.payees.len(),
            categories = ledger.categories.len(),
            tags = ledger.tags.len(),
            assignments = ledger.assignments.len(),
            entries = ledger.existing.len(),
            "settings document parsed"
        );
        Ok(ledger)
    }
}

/// Loads a paymode pattern rules file into the ledger and orders all sets
/// and patterns by specificity.
pub fn load_paymode_patterns(path: &Path, ledger: &mut Ledger) -> Result<(), DocumentError> {
    let file = File::open(path)?;
    let root = Element::parse(BufReader::new(file))?;
    parse_paymode_patterns(&root, ledger)
}

pub fn parse_paymode_patterns_str(input: &str, ledger: &mut Ledger) -> Result<(), DocumentError> {
    let root = Element::parse(input.as_bytes())?;
    parse_paymode_patterns(&root, ledger)
}

fn parse_paymode_patterns(root: &Element, ledger: &mut Ledger) -> Result<(), DocumentError> {
    if root.name == "paymodepatterns" {
        ledger.paymode_sets.push(parse_pattern_set(root)?);
    } else {
        for element in root.children.iter().filter_map(XMLNode::as_element) {
            if element.name == "paymodepatterns" {
                ledger.paymode_sets.push(parse_pattern_set(element)?);
            }
        }
    }

    for set in &mut ledger.paymode_sets {
        set.sort_patterns();
    }
    ledger.paymode_sets.sort_by_key(|s| s.specificity());
    debug!(sets = ledger.paymode_sets.len(), "paymode patterns loaded");
    Ok(())
}

fn parse_pattern_set(element: &Element) -> Result<PaymodePatternSet, DocumentError> {
    let type_name = require_attr(element, "type")?;
    let paymode = Paymode::from_name(type_name).ok_or_else(|| DocumentError::Attribute {
        element: element.name.clone(),
        attribute: "type".into(),
        value: type_name.to_string(),
    })?;

    let mut patterns = Vec::new();
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        if child.name != "pattern" {
            continue;
        }
        // A pattern without accounting text is meaningless and skipped.
        let Some(accounting_text) = attr(child, "accountingtext") else {
            continue;
        };
        let pattern = PaymodePattern::new(
            accounting_text,
            attr(child, "memo"),
            attr(child, "destination-account-pattern"),
            attr(child, "tags").map(str::to_string),
        )
        .map_err(|e| DocumentError::Pattern(e.to_string()))?;
        patterns.push(pattern);
    }

    Ok(PaymodePatternSet { paymode, patterns })
}

fn attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

fn require_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str, DocumentError> {
    attr(element, name).ok_or_else(|| DocumentError::Attribute {
        element: element.name.clone(),
        attribute: name.into(),
        value: "<missing>".into(),
    })
}

/// Parses an attribute that must be present; missing and malformed are both
/// fatal.
fn require_parse_attr<T: FromStr>(element: &Element, name: &str) -> Result<T, DocumentError> {
    let value = require_attr(element, name)?;
    value.parse::<T>().map_err(|_| DocumentError::Attribute {
        element: element.name.clone(),
        attribute: name.into(),
        value: value.to_string(),
    })
}

/// Parses an attribute when present; a value that fails to parse is fatal.
fn parse_attr<T: FromStr>(element: &Element, name: &str) -> Result<Option<T>, DocumentError> {
    match attr(element, name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| DocumentError::Attribute {
                element: element.name.clone(),
                attribute: name.into(),
                value: value.to_string(),
            }),
    }
}

fn parse_account(element: &Element) -> Result<Account, DocumentError> {
    Ok(Account {
        key: parse_attr(element, "key")?.unwrap_or(0),
        name: attr(element, "name").unwrap_or_default().to_string(),
        account_type: parse_attr(element, "type")?
            .map(AccountType::from_code)
            .unwrap_or_default(),
        institute_number: attr(element, "number").unwrap_or_default().to_string(),
        institute_name: attr(element, "bankname").unwrap_or_default().to_string(),
        initial_amount: parse_attr(element, "initial")?.unwrap_or(0.0),
        minimum_amount: parse_attr(element, "minimum")?.unwrap_or(0.0),
    })
}

fn parse_payee(element: &Element) -> Result<Payee, DocumentError> {
    Ok(Payee {
        key: parse_attr(element, "key")?.unwrap_or(0),
        name: attr(element, "name").unwrap_or_default().to_string(),
    })
}

fn parse_category(element: &Element, earlier: &[Category]) -> Result<Category, DocumentError> {
    let parent = parse_attr::<u32>(element, "parent")?
        .filter(|key| earlier.iter().any(|c| c.key == *key));
    Ok(Category {
        key: parse_attr(element, "key")?.unwrap_or(0),
        name: attr(element, "name").unwrap_or_default().to_string(),
        category_type: parse_attr(element, "flags")?
            .map(CategoryType::from_flags)
            .unwrap_or_default(),
        parent,
    })
}

fn parse_tag(element: &Element) -> Result<Tag, DocumentError> {
    Ok(Tag {
        key: parse_attr(element, "key")?.unwrap_or(0),
        name: attr(element, "name").unwrap_or_default().to_string(),
        from_document: true,
    })
}

fn parse_assignment(element: &Element, ledger: &Ledger) -> Result<Assignment, DocumentError> {
    // Flag 7 requests case-insensitive matching, 6 is case-sensitive.
    let ignore_case = parse_attr::<u32>(element, "flags")?.is_some_and(|f| f != 6);
    let field = parse_attr::<u32>(element, "field")?
        .map(ConditionField::from_code)
        .unwrap_or_default();
    let payee = parse_attr::<u32>(element, "payee")?
        .filter(|key| ledger.payees.iter().any(|p| p.key == *key));
    let category = parse_attr::<u32>(element, "category")?
        .filter(|key| ledger.categories.iter().any(|c| c.key == *key));

    Assignment::new(
        parse_attr(element, "key")?.unwrap_or(0),
        attr(element, "name").unwrap_or_default().to_string(),
        ignore_case,
        field,
        payee,
        category,
    )
    .map_err(|e| DocumentError::Pattern(e.to_string()))
}

fn parse_entry(element: &Element, ledger: &Ledger) -> Result<Entry, DocumentError> {
    // Every entry carries a date and an amount; anything else is a broken
    // document, not a default.
    let day: u32 = require_parse_attr(element, "date")?;
    let date = entry::day_number_to_date(day).ok_or_else(|| DocumentError::Attribute {
        element: element.name.clone(),
        attribute: "date".into(),
        value: day.to_string(),
    })?;

    Ok(Entry {
        date,
        amount: require_parse_attr(element, "amount")?,
        paymode: parse_attr(element, "paymode")?
            .map(Paymode::from_code)
            .unwrap_or_default(),
        payee: parse_attr::<u32>(element, "payee")?
            .filter(|key| ledger.payees.iter().any(|p| p.key == *key)),
        category: parse_attr::<u32>(element, "category")?
            .filter(|key| ledger.categories.iter().any(|c| c.key == *key)),
        account: parse_attr::<u32>(element, "account")?
            .filter(|key| ledger.accounts.iter().any(|a| a.key == *key)),
        destination_account: parse_attr::<u32>(element, "dst_account")?
            .filter(|key| ledger.accounts.iter().any(|a| a.key == *key)),
        memo: attr(element, "wording").unwrap_or_default().to_string(),
        info: attr(element, "info").unwrap_or_default().to_string(),
        tags: attr(element, "tags")
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        status: parse_attr(element, "st")?
            .map(Status::from_code)
            .unwrap_or_default(),
        flags: parse_attr(element, "flags")?.unwrap_or(0),
        link_id: parse_attr(element, "kxfer")?.unwrap_or(0),
        splits: parse_splits(element)?,
    })
}

/// Splits are stored as three parallel `||`-joined attribute lists.
fn parse_splits(element: &Element) -> Result<Vec<Split>, DocumentError> {
    let Some(scat) = attr(element, "scat") else {
        return Ok(Vec::new());
    };
    let categories: Vec<&str> = scat.split("||").collect();
    let amounts: Vec<&str> = attr(element, "samt").map(|s| s.split("||").collect()).unwrap_or_default();
    let memos: Vec<&str> = attr(element, "smem").map(|s| s.split("||").collect()).unwrap_or_default();

    let mut splits = Vec::with_capacity(categories.len());
    for (i, category) in categories.iter().enumerate() {
        let amount_text = amounts.get(i).copied().unwrap_or("0");
        let amount = amount_text
            .parse::<f64>()
            .map_err(|_| DocumentError::Attribute {
                element: element.name.clone(),
                attribute: "samt".into(),
                value: amount_text.to_string(),
            })?;
        splits.push(Split {
            category: category.to_string(),
            amount,
            memo: memos.get(i).copied().unwrap_or_default().to_string(),
        });
    }
    Ok(splits)
}

/// Builds the regex used to resolve the target-account pattern.
fn compile_account_pattern(pattern: &str) -> Result<Regex, DocumentError> {
    RegexBuilder::new(pattern)
        .build()
        .map_err(|e| DocumentError::Pattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<homebank v="1.3">
<properties title="test" curr="1"/>
<account key="1" pos="1" type="1" name="Checking" number="AT12" bankname="Hello Bank" initial="100" minimum="0"/>
<account key="2" pos="2" type="3" name="Savings" initial="0" minimum="0"/>
<pay key="1" name="Grocery Mart"/>
<cat key="1" name="Food" flags="1"/>
<cat key="2" name="Groceries" parent="1" flags="1"/>
<cat key="3" name="Salary" flags="3"/>
<tag key="1" name="holiday"/>
<asg key="1" flags="7" field="0" name="Grocery Mart" payee="1" category="2"/>
<ope date="739341" amount="-12.5" paymode="6" payee="1" category="2" account="1" wording="weekly shop" info="POS purchase" st="2" flags="256" kxfer="3"/>
</homebank>"#;

    #[test]
    fn forward_scan_builds_all_collections() {
        let doc = Document::parse_str(SAMPLE).unwrap();
        let ledger = doc.build_ledger(Some("Check")).unwrap();
        assert_eq!(ledger.accounts.len(), 2);
        assert_eq!(ledger.payees.len(), 1);
        assert_eq!(ledger.categories.len(), 3);
        assert_eq!(ledger.tags.len(), 1);
        assert_eq!(ledger.assignments.len(), 1);
        assert_eq!(ledger.existing.len(), 1);
        assert_eq!(ledger.target_account, Some(1));
        assert_eq!(ledger.max_link_id, 3);
        assert_eq!(ledger.accounts[0].account_type, AccountType::Institute);
        assert_eq!(ledger.categories[2].category_type, CategoryType::Income);
    }

    #[test]
    fn parent_references_resolve_forward_only() {
        let doc = Document::parse_str(
            r#"<homebank>
<cat key="2" name="Groceries" parent="1"/>
<cat key="1" name="Food"/>
</homebank>"#,
        )
        .unwrap();
        let ledger = doc.build_ledger(None).unwrap();
        // Parent appears later in the document, so the reference is dropped.
        assert_eq!(ledger.categories[0].parent, None);
        assert!(!ledger.categories[0].is_subcategory());
    }

    #[test]
    fn malformed_attribute_is_fatal() {
        let doc =
            Document::parse_str(r#"<homebank><account key="abc" name="X"/></homebank>"#).unwrap();
        assert!(matches!(
            doc.build_ledger(None),
            Err(DocumentError::Attribute { .. })
        ));
    }

    #[test]
    fn entry_without_date_is_rejected() {
        let doc =
            Document::parse_str(r#"<homebank><ope amount="-5.0"/></homebank>"#).unwrap();
        assert!(matches!(
            doc.build_ledger(None),
            Err(DocumentError::Attribute { .. })
        ));
    }

    #[test]
    fn entry_without_amount_is_rejected() {
        let doc =
            Document::parse_str(r#"<homebank><ope date="738500"/></homebank>"#).unwrap();
        assert!(matches!(
            doc.build_ledger(None),
            Err(DocumentError::Attribute { .. })
        ));
    }

    #[test]
    fn invalid_account_pattern_is_fatal() {
        let doc = Document::parse_str(SAMPLE).unwrap();
        assert!(matches!(
            doc.build_ledger(Some("[")),
            Err(DocumentError::Pattern(_))
        ));
    }

    #[test]
    fn unrecognized_elements_are_skipped() {
        let doc = Document::parse_str(
            r#"<homebank><favorite key="1"/><pay key="1" name="A"/></homebank>"#,
        )
        .unwrap();
        let ledger = doc.build_ledger(None).unwrap();
        assert_eq!(ledger.payees.len(), 1);
    }

    #[test]
    fn existing_entry_round_trips_fields() {
        let doc = Document::parse_str(SAMPLE).unwrap();
        let ledger = doc.build_ledger(None).unwrap();
        let entry = &ledger.existing[0];
        assert_eq!(entry.amount, -12.5);
        assert_eq!(entry.paymode, Paymode::DebitCard);
        assert_eq!(entry.status, Status::Reconciled);
        assert_eq!(entry.memo, "weekly shop");
        assert_eq!(entry.info, "POS purchase");
        assert_eq!(entry.link_id, 3);
    }

    #[test]
    fn pattern_file_parses_and_orders_sets() {
        let mut ledger = Ledger::default();
        parse_paymode_patterns_str(
            r#"<patterns>
<paymodepatterns type="Transfer">
  <pattern accountingtext="transfer"/>
</paymodepatterns>
<paymodepatterns type="StandingOrder">
  <pattern accountingtext="transfer" memo="rent"/>
</paymodepatterns>
</patterns>"#,
            &mut ledger,
        )
        .unwrap();
        assert_eq!(ledger.paymode_sets.len(), 2);
        // The level-1 set sorts ahead of the level-2 set.
        assert_eq!(ledger.paymode_sets[0].paymode, Paymode::StandingOrder);
        assert_eq!(ledger.paymode_sets[0].specificity(), 1);
    }

    #[test]
    fn pattern_file_with_unknown_type_fails() {
        let mut ledger = Ledger::default();
        let result = parse_paymode_patterns_str(
            r#"<paymodepatterns type="Barter"><pattern accountingtext="x"/></paymodepatterns>"#,
            &mut ledger,
        );
        assert!(matches!(result, Err(DocumentError::Attribute { .. })));
    }
}
