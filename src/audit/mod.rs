use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::database::models::{Account, AccountType};
use crate::error::StorageError;

/// Column names written as the first row of a new log
pub const HEADER: [&str; 6] = ["timestamp", "username", "account_type", "action", "amount", "balance"];

/// Kind of event recorded in the transaction log
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Login,
    Create,
    Delete,
    Deposit,
    Withdraw,
    PinReset,
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Login => "login",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
            ActionKind::Deposit => "deposit",
            ActionKind::Withdraw => "withdraw",
            ActionKind::PinReset => "pin_reset",
        }
    }
}

/// One row of the audit log
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub account_type: AccountType,
    pub action: ActionKind,
    /// Empty for actions that do not move money
    pub amount: Option<Decimal>,
    /// Balance after the action
    pub balance: Decimal,
}

impl TransactionRecord {
    /// Record an event against the account's state after the action
    pub fn new(account: &Account, action: ActionKind, amount: Option<Decimal>) -> Self {
        Self {
            timestamp: Utc::now(),
            username: account.username.clone(),
            account_type: account.account_type,
            action,
            amount,
            balance: account.balance,
        }
    }
}

/// Flat row shape handed to the CSV writer
#[derive(Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    username: &'a str,
    account_type: AccountType,
    action: ActionKind,
    amount: Option<String>,
    balance: String,
}

impl<'a> From<&'a TransactionRecord> for CsvRow<'a> {
    fn from(record: &'a TransactionRecord) -> Self {
        Self {
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            username: &record.username,
            account_type: record.account_type,
            action: record.action,
            amount: record.amount.map(format_amount),
            balance: format_amount(record.balance),
        }
    }
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Append-only CSV transaction log, opened once per run
pub struct TransactionLog {
    writer: csv::Writer<File>,
    path: String,
}

impl TransactionLog {
    /// Open the log for appending, writing the header row if the file is new
    pub fn open(path: &str) -> Result<Self, StorageError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            debug!("Writing header to new transaction log {}", path);
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        info!("Transaction log opened at {}", path);
        Ok(Self {
            writer,
            path: path.to_string(),
        })
    }

    /// Append one record and flush it to disk
    pub fn append(&mut self, record: &TransactionRecord) -> Result<(), StorageError> {
        self.writer.serialize(CsvRow::from(record))?;
        self.writer.flush()?;

        debug!(
            "Logged {} for {} to {}",
            record.action.as_str(),
            record.username,
            self.path
        );
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wrap an already open file without touching its header
    #[cfg(test)]
    pub(crate) fn from_file(file: File, path: &str) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(file),
            path: path.to_string(),
        }
    }
}
