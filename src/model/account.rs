/// Kinds of accounts a HomeBank file can hold, with their integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    Unknown,
    Institute,
    Cash,
    Assets,
    CreditCard,
    Liabilities,
}

impl AccountType {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => AccountType::Institute,
            2 => AccountType::Cash,
            3 => AccountType::Assets,
            4 => AccountType::CreditCard,
            5 => AccountType::Liabilities,
            _ => AccountType::Unknown,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            AccountType::Unknown => 0,
            AccountType::Institute => 1,
            AccountType::Cash => 2,
            AccountType::Assets => 3,
            AccountType::CreditCard => 4,
            AccountType::Liabilities => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Unknown => "unknown",
            AccountType::Institute => "institute",
            AccountType::Cash => "cash",
            AccountType::Assets => "assets",
            AccountType::CreditCard => "credit card",
            AccountType::Liabilities => "liabilities",
        }
    }
}

/// An account defined in the ledger document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Account {
    pub key: u32,
    pub name: String,
    pub account_type: AccountType,
    pub institute_number: String,
    pub institute_name: String,
    pub initial_amount: f64,
    pub minimum_amount: f64,
}
