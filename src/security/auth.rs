use log::{debug, info, warn};
use std::collections::HashMap;

use crate::audit::{ActionKind, TransactionRecord};
use crate::context::BankContext;
use crate::database::models::Account;
use crate::error::BankError;
use crate::security::pin;

/// Consecutive failed PIN entries per username, kept for the lifetime of a session
#[derive(Debug)]
pub struct LoginAttempts {
    failures: HashMap<String, u32>,
    limit: u32,
}

impl LoginAttempts {
    pub fn new(limit: u32) -> Self {
        Self {
            failures: HashMap::new(),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn failures(&self, username: &str) -> u32 {
        self.failures.get(username).copied().unwrap_or(0)
    }

    /// Count one more failure and return the new total
    pub fn record_failure(&mut self, username: &str) -> u32 {
        let count = self.failures.entry(username.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn reset(&mut self, username: &str) {
        self.failures.remove(username);
    }

    /// True once the user has used up every attempt
    pub fn is_exhausted(&self, username: &str) -> bool {
        self.failures(username) >= self.limit
    }
}

/// Authenticate a user by username and PIN.
///
/// A mismatch counts against the username; a match clears its counter and
/// appends a login record.
pub fn authenticate(
    ctx: &mut BankContext,
    attempts: &mut LoginAttempts,
    username: &str,
    pin_input: &str,
) -> Result<Account, BankError> {
    let account = match ctx.store().get(username)? {
        Some(account) => account,
        None => {
            debug!("Login attempted for unknown user {}", username);
            return Err(BankError::authentication("No such user exists."));
        }
    };

    if !pin::verify_pin(pin_input, &account.pin_hash) {
        let count = attempts.record_failure(username);
        warn!("Failed login for {} ({} of {})", username, count, attempts.limit());
        return Err(BankError::authentication(format!(
            "Invalid PIN. Attempt {} of {}.",
            count,
            attempts.limit()
        )));
    }

    attempts.reset(username);
    ctx.record(&TransactionRecord::new(&account, ActionKind::Login, None))?;

    info!("User {} logged in", username);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TransactionLog;
    use crate::database::models::AccountType;
    use crate::database::{AccountStore, SqliteAccountStore};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, BankContext) {
        let dir = tempdir().unwrap();
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store
            .upsert(&Account::new(
                "alice".to_string(),
                "Alice".to_string(),
                pin::hash_pin("1234").unwrap(),
                AccountType::Checking,
            ))
            .unwrap();
        let log = TransactionLog::open(dir.path().join("log.csv").to_str().unwrap()).unwrap();
        (dir, BankContext::new(Box::new(store), log, 3))
    }

    #[test]
    fn test_successful_login_resets_counter() {
        let (_dir, mut ctx) = setup();
        let mut attempts = LoginAttempts::new(3);

        assert!(authenticate(&mut ctx, &mut attempts, "alice", "0000").is_err());
        assert_eq!(attempts.failures("alice"), 1);

        let account = authenticate(&mut ctx, &mut attempts, "alice", "1234").unwrap();
        assert_eq!(account.name, "Alice");
        assert_eq!(attempts.failures("alice"), 0);
    }

    #[test]
    fn test_three_failures_exhaust_attempts() {
        let (_dir, mut ctx) = setup();
        let mut attempts = LoginAttempts::new(3);

        for expected in 1..=3 {
            let err = authenticate(&mut ctx, &mut attempts, "alice", "9999").unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid PIN. Attempt {} of 3.", expected)
            );
        }
        assert!(attempts.is_exhausted("alice"));
    }

    #[test]
    fn test_malformed_pin_counts_as_failure() {
        let (_dir, mut ctx) = setup();
        let mut attempts = LoginAttempts::new(3);

        let err = authenticate(&mut ctx, &mut attempts, "alice", "12").unwrap_err();
        assert!(matches!(err, BankError::Authentication(_)));
        assert_eq!(attempts.failures("alice"), 1);
    }

    #[test]
    fn test_unknown_user_is_not_counted() {
        let (_dir, mut ctx) = setup();
        let mut attempts = LoginAttempts::new(3);

        let err = authenticate(&mut ctx, &mut attempts, "mallory", "1234").unwrap_err();
        assert!(matches!(err, BankError::Authentication(_)));
        assert_eq!(attempts.failures("mallory"), 0);
    }

    #[test]
    fn test_counters_are_per_username() {
        let mut attempts = LoginAttempts::new(3);
        attempts.record_failure("alice");
        attempts.record_failure("alice");
        attempts.record_failure("bob");

        assert_eq!(attempts.failures("alice"), 2);
        assert_eq!(attempts.failures("bob"), 1);

        attempts.reset("alice");
        assert_eq!(attempts.failures("alice"), 0);
        assert_eq!(attempts.failures("bob"), 1);
    }
}
