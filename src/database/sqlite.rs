use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;

use super::models::{Account, AccountType};
use super::schema;
use super::AccountStore;
use crate::error::StorageError;

const SELECT_ACCOUNT: &str =
    "SELECT username, name, pin_hash, account_type, balance, created_at FROM accounts";

/// Account store backed by an SQLite database file
pub struct SqliteAccountStore {
    conn: Connection,
}

impl SqliteAccountStore {
    /// Open (or create) the database and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut conn = Connection::open(path)?;
        schema::create_schema(&mut conn)?;
        debug!("Using database at {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory()?;
        schema::create_schema(&mut conn)?;
        Ok(Self { conn })
    }

    fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
        let account_type_str: String = row.get(3)?;
        let balance_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;

        Ok(Account {
            username: row.get(0)?,
            name: row.get(1)?,
            pin_hash: row.get(2)?,
            account_type: AccountType::from_str(&account_type_str).map_err(|_| {
                rusqlite::Error::InvalidColumnType(3, account_type_str.clone(), rusqlite::types::Type::Text)
            })?,
            balance: balance_str.parse::<Decimal>().map_err(|_| {
                rusqlite::Error::InvalidColumnType(4, balance_str.clone(), rusqlite::types::Type::Text)
            })?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(5, created_at_str.clone(), rusqlite::types::Type::Text)
                })?
                .with_timezone(&Utc),
        })
    }
}

impl AccountStore for SqliteAccountStore {
    fn load(&self) -> Result<Vec<Account>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY username", SELECT_ACCOUNT))?;

        let accounts = stmt
            .query_map([], Self::row_to_account)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(accounts)
    }

    fn get(&self, username: &str) -> Result<Option<Account>, StorageError> {
        let account = self
            .conn
            .query_row(
                &format!("{} WHERE username = ?1", SELECT_ACCOUNT),
                params![username],
                Self::row_to_account,
            )
            .optional()?;

        Ok(account)
    }

    fn upsert(&mut self, account: &Account) -> Result<(), StorageError> {
        if account.balance.is_sign_negative() {
            return Err(StorageError::Corrupt {
                username: account.username.clone(),
                reason: "negative balance".to_string(),
            });
        }

        self.conn.execute(
            "INSERT INTO accounts (username, name, pin_hash, account_type, balance, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(username) DO UPDATE SET
                name = excluded.name,
                pin_hash = excluded.pin_hash,
                account_type = excluded.account_type,
                balance = excluded.balance,
                updated_at = excluded.updated_at",
            params![
                account.username,
                account.name,
                account.pin_hash,
                account.account_type.as_str(),
                account.balance.to_string(),
                account.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Upserted account {}", account.username);
        Ok(())
    }

    fn delete(&mut self, username: &str) -> Result<bool, StorageError> {
        let removed = self
            .conn
            .execute("DELETE FROM accounts WHERE username = ?1", params![username])?;

        debug!("Deleted {} row(s) for {}", removed, username);
        Ok(removed > 0)
    }
}
