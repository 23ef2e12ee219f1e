use rust_decimal::Decimal;
use thiserror::Error;

/// Failures raised by the account store and the transaction log
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode account data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to write transaction log: {0}")]
    Csv(#[from] csv::Error),

    #[error("Corrupt record for '{username}': {reason}")]
    Corrupt { username: String, reason: String },
}

/// Errors surfaced to the session controller
#[derive(Debug, Error)]
pub enum BankError {
    /// Malformed PIN, username or amount
    #[error("{0}")]
    Validation(String),

    /// PIN mismatch, unknown username or missing session
    #[error("{0}")]
    Authentication(String),

    #[error("Insufficient funds: requested ${requested:.2}, available ${available:.2}")]
    InsufficientFunds { requested: Decimal, available: Decimal },

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BankError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BankError::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        BankError::Authentication(msg.into())
    }

    /// Storage failures abort the current action; everything else is a user mistake
    pub fn is_storage(&self) -> bool {
        matches!(self, BankError::Storage(_))
    }
}
