use log::info;

use crate::audit::{TransactionLog, TransactionRecord};
use crate::config::Config;
use crate::database::{self, AccountStore};
use crate::error::StorageError;

/// The open store and log handles for one run of the program.
///
/// Built once at startup and owned by the session controller. Both handles
/// are closed when the context is dropped.
pub struct BankContext {
    store: Box<dyn AccountStore>,
    log: TransactionLog,
    max_failed_attempts: u32,
}

impl BankContext {
    /// Open the configured store and transaction log
    pub fn open(config: &Config) -> Result<Self, StorageError> {
        let store = database::open_store(&config.storage)?;
        let log = TransactionLog::open(&config.audit.log_path)?;

        info!(
            "Bank context ready ({} store, log at {})",
            config.storage.backend.as_str(),
            log.path()
        );

        Ok(Self::new(store, log, config.security.max_failed_attempts))
    }

    pub fn new(store: Box<dyn AccountStore>, log: TransactionLog, max_failed_attempts: u32) -> Self {
        Self {
            store,
            log,
            max_failed_attempts,
        }
    }

    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn AccountStore {
        self.store.as_mut()
    }

    /// Append to the audit log. Independent of any store write that preceded it.
    pub fn record(&mut self, record: &TransactionRecord) -> Result<(), StorageError> {
        self.log.append(record)
    }

    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }
}
