//! Structural editing of the settings document: appending newly created tags
//! and inserting converted entries at their chronological position.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;
use xmltree::{Element, EmitterConfig, XMLNode};

use super::{Document, DocumentError};
use crate::model::{Entry, Tag, entry};

/// Anchor element kinds for tag insertion, in fallback search order.
const TAG_ANCHORS: [&str; 5] = ["tag", "cat", "pay", "account", "properties"];

impl Document {
    /// Merges accepted entries and newly created tags into the document.
    ///
    /// Entries are expected pre-sorted (the conversion pipeline preserves the
    /// source order); duplicates must have been filtered out beforehand.
    pub fn merge(&mut self, entries: &[Entry], new_tags: &[Tag]) {
        append_tags(&mut self.root, new_tags);
        insert_entries(&mut self.root, entries);
        info!(
            entries = entries.len(),
            tags = new_tags.len(),
            "merged into settings document"
        );
    }

    /// Re-serializes the whole document with a fixed declaration and
    /// indentation.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let file = File::create(path)?;
        let config = EmitterConfig::new()
            .perform_indent(true)
            .write_document_declaration(true);
        self.root
            .write_with_config(BufWriter::new(file), config)
            .map_err(|e| DocumentError::Write(e.to_string()))
    }

    pub fn to_xml_string(&self) -> Result<String, DocumentError> {
        let mut buffer = Vec::new();
        let config = EmitterConfig::new()
            .perform_indent(true)
            .write_document_declaration(true);
        self.root
            .write_with_config(&mut buffer, config)
            .map_err(|e| DocumentError::Write(e.to_string()))?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Appends `<tag>` elements after the last element of the highest-priority
/// anchor kind present: tags, else categories, else payees, else accounts,
/// else the properties block, else as first child.
fn append_tags(root: &mut Element, new_tags: &[Tag]) {
    let mut position = anchor_position(root);
    for tag in new_tags {
        let mut element = Element::new("tag");
        element
            .attributes
            .insert("key".to_string(), tag.key.to_string());
        element
            .attributes
            .insert("name".to_string(), tag.name.clone());
        root.children.insert(position, XMLNode::Element(element));
        position += 1;
    }
}

fn anchor_position(root: &Element) -> usize {
    for anchor in TAG_ANCHORS {
        let last = root
            .children
            .iter()
            .rposition(|node| node.as_element().is_some_and(|e| e.name == anchor));
        if let Some(index) = last {
            return index + 1;
        }
    }
    0
}

/// Inserts each entry's `<ope>` element after the last existing entry whose
/// date is not later, walking from a cursor so a pre-sorted batch stays in
/// arrival order.
fn insert_entries(root: &mut Element, entries: &[Entry]) {
    for entry in entries {
        let day = entry::date_to_day_number(entry.date);
        let position = insertion_position(root, day);
        root.children
            .insert(position, XMLNode::Element(entry_to_element(entry)));
    }
}

fn insertion_position(root: &Element, day: u32) -> usize {
    let mut position = None;
    let mut first_ope = None;
    for (index, node) in root.children.iter().enumerate() {
        let Some(element) = node.as_element() else {
            continue;
        };
        if element.name != "ope" {
            continue;
        }
        first_ope.get_or_insert(index);
        let existing_day = element
            .attributes
            .get("date")
            .and_then(|d| d.parse::<u32>().ok())
            .unwrap_or(0);
        if existing_day <= day {
            position = Some(index + 1);
        }
    }
    // Before the first entry when all existing dates are later; at the end
    // of the document when there are no entries at all.
    position
        .or(first_ope)
        .unwrap_or_else(|| root.children.len())
}

fn entry_to_element(entry: &Entry) -> Element {
    let mut element = Element::new("ope");
    let mut set = |name: &str, value: String| {
        element.attributes.insert(name.to_string(), value);
    };

    set("date", entry::date_to_day_number(entry.date).to_string());
    set("amount", entry.amount.to_string());
    if entry.paymode.code() != 0 {
        set("paymode", entry.paymode.code().to_string());
    }
    if let Some(key) = entry.payee {
        set("payee", key.to_string());
    }
    if let Some(key) = entry.category {
        set("category", key.to_string());
    }
    if let Some(key) = entry.account {
        set("account", key.to_string());
    }
    if let Some(key) = entry.destination_account {
        set("dst_account", key.to_string());
    }
    if !entry.memo.is_empty() {
        set("wording", entry.memo.clone());
    }
    if !entry.info.is_empty() {
        set("info", entry.info.clone());
    }
    if !entry.tags.is_empty() {
        set("tags", entry.tags.join(" "));
    }
    if entry.status.code() != 0 {
        set("st", entry.status.code().to_string());
    }
    if entry.flags != 0 {
        set("flags", entry.flags.to_string());
    }
    if entry.link_id != 0 {
        set("kxfer", entry.link_id.to_string());
    }
    if !entry.splits.is_empty() {
        let join = |f: fn(&crate::model::Split) -> String| {
            entry
                .splits
                .iter()
                .map(f)
                .collect::<Vec<_>>()
                .join("||")
        };
        set("scat", join(|s| s.category.clone()));
        set("samt", join(|s| s.amount.to_string()));
        set("smem", join(|s| s.memo.clone()));
    }

    element
}
