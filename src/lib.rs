//! HomeBank import
//!
//! Converts Hello Bank CSV exports into HomeBank ledger entries, resolving
//! payees, categories, payment modes, destination accounts and tags from the
//! ledger's own settings document, and merges the result back into that
//! document without duplicates and without breaking chronological order.

pub mod convert;
pub mod dedup;
pub mod document;
pub mod export;
pub mod import;
pub mod locale;
pub mod model;
