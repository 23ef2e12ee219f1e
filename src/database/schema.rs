use log::debug;
use rusqlite::Connection;

use crate::error::StorageError;

/// Create the database schema
pub fn create_schema(conn: &mut Connection) -> Result<(), StorageError> {
    debug!("Creating database schema");

    // Use a transaction to ensure the table and index are created together
    let tx = conn.transaction()?;

    // Balances are stored as decimal text so they round-trip exactly
    tx.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            username TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            pin_hash TEXT NOT NULL,
            account_type TEXT NOT NULL,
            balance TEXT NOT NULL DEFAULT '0',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_account_type ON accounts(account_type)",
        [],
    )?;

    tx.commit()?;

    debug!("Database schema created successfully");
    Ok(())
}
