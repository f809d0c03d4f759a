/// A payee defined in the ledger document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payee {
    pub key: u32,
    pub name: String,
}
