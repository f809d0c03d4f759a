/// A tag defined in the ledger document, or allocated during conversion.
///
/// `from_document` separates tags that were parsed from the settings file
/// from tags newly created by the conversion pipeline; only the latter are
/// appended to the document on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: u32,
    pub name: String,
    pub from_document: bool,
}

impl Tag {
    pub fn new(key: u32, name: impl Into<String>) -> Self {
        Tag {
            key,
            name: name.into(),
            from_document: false,
        }
    }
}
