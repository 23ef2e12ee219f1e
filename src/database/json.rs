use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::models::{Account, AccountType};
use super::AccountStore;
use crate::error::StorageError;

/// On-disk shape of one account; the username is the map key
#[derive(Debug, Serialize, Deserialize, Clone)]
struct StoredAccount {
    name: String,
    pin_hash: String,
    account_type: AccountType,
    balance: Decimal,
    created_at: DateTime<Utc>,
}

/// Account store backed by a single JSON document.
///
/// The document is read once on open and rewritten in full after every
/// mutation. Keys are kept sorted.
pub struct JsonAccountStore {
    path: PathBuf,
    accounts: BTreeMap<String, StoredAccount>,
}

impl JsonAccountStore {
    /// Open the store; a missing file is an empty store
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let accounts = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No account file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path: path.to_path_buf(),
            accounts,
        };
        store.check_balances()?;

        debug!("Loaded {} accounts from {}", store.accounts.len(), path.display());
        Ok(store)
    }

    fn check_balances(&self) -> Result<(), StorageError> {
        match self.accounts.iter().find(|(_, stored)| stored.balance.is_sign_negative()) {
            Some((username, _)) => Err(StorageError::Corrupt {
                username: username.clone(),
                reason: "negative balance".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn save(&self) -> Result<(), StorageError> {
        let serialized = serde_json::to_string_pretty(&self.accounts)?;
        fs::write(&self.path, serialized)?;
        debug!("Saved {} accounts to {}", self.accounts.len(), self.path.display());
        Ok(())
    }

    fn to_account(username: &str, stored: &StoredAccount) -> Account {
        Account {
            username: username.to_string(),
            name: stored.name.clone(),
            pin_hash: stored.pin_hash.clone(),
            account_type: stored.account_type,
            balance: stored.balance,
            created_at: stored.created_at,
        }
    }
}

impl AccountStore for JsonAccountStore {
    fn load(&self) -> Result<Vec<Account>, StorageError> {
        Ok(self
            .accounts
            .iter()
            .map(|(username, stored)| Self::to_account(username, stored))
            .collect())
    }

    fn get(&self, username: &str) -> Result<Option<Account>, StorageError> {
        Ok(self
            .accounts
            .get(username)
            .map(|stored| Self::to_account(username, stored)))
    }

    fn upsert(&mut self, account: &Account) -> Result<(), StorageError> {
        if account.balance.is_sign_negative() {
            return Err(StorageError::Corrupt {
                username: account.username.clone(),
                reason: "negative balance".to_string(),
            });
        }

        let stored = StoredAccount {
            name: account.name.clone(),
            pin_hash: account.pin_hash.clone(),
            account_type: account.account_type,
            balance: account.balance,
            created_at: account.created_at,
        };

        let previous = self.accounts.insert(account.username.clone(), stored);
        if let Err(e) = self.save() {
            // keep memory in step with the file that failed to update
            match previous {
                Some(previous) => self.accounts.insert(account.username.clone(), previous),
                None => self.accounts.remove(&account.username),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, username: &str) -> Result<bool, StorageError> {
        let Some(previous) = self.accounts.remove(username) else {
            return Ok(false);
        };

        if let Err(e) = self.save() {
            self.accounts.insert(username.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }
}
