use log::{debug, info};
use std::path::Path;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StorageError;

mod json;
mod schema;
mod sqlite;
pub mod models;

pub use json::JsonAccountStore;
pub use sqlite::SqliteAccountStore;

use models::Account;

/// Persistent mapping from username to account record.
///
/// Every mutation is persisted before the call returns. Nothing links a store
/// write to the matching transaction log append.
#[cfg_attr(test, mockall::automock)]
pub trait AccountStore {
    /// All accounts, ordered by username
    fn load(&self) -> Result<Vec<Account>, StorageError>;

    fn get(&self, username: &str) -> Result<Option<Account>, StorageError>;

    /// Insert a new account or overwrite the existing one with the same username
    fn upsert(&mut self, account: &Account) -> Result<(), StorageError>;

    /// Remove an account. Returns `false` when no such account existed.
    fn delete(&mut self, username: &str) -> Result<bool, StorageError>;
}

/// Open the configured account store
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn AccountStore>, StorageError> {
    let path = Path::new(&config.path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating storage directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    let store: Box<dyn AccountStore> = match config.backend {
        StorageBackend::Json => Box::new(JsonAccountStore::open(path)?),
        StorageBackend::Sqlite => Box::new(SqliteAccountStore::open(path)?),
    };

    info!("Opened {} account store at {}", config.backend.as_str(), config.path);
    Ok(store)
}
