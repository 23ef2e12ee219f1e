//! Cactus Bank - a terminal banking demo.
//!
//! Accounts are protected by a hashed four digit PIN and persisted to a JSON
//! document or an SQLite database. Every account-affecting action is appended
//! to a CSV audit log.

pub mod account;
pub mod audit;
pub mod cli;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod security;

pub use context::BankContext;
pub use error::{BankError, StorageError};
