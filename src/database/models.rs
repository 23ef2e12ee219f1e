use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub const ALL: [AccountType; 2] = [AccountType::Checking, AccountType::Savings];

    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
        }
    }

    /// Accepts the full name or the single letter used at the menu prompt
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "checking" | "c" => Ok(AccountType::Checking),
            "savings" | "s" => Ok(AccountType::Savings),
            _ => Err(format!("Invalid account type: {}", s)),
        }
    }
}

/// Account model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Account {
    pub username: String,
    pub name: String,
    pub pin_hash: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account always starts with a zero balance
    pub fn new(username: String, name: String, pin_hash: String, account_type: AccountType) -> Self {
        Self {
            username,
            name,
            pin_hash,
            account_type,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}
