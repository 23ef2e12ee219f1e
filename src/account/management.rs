use log::{info, warn};

use crate::audit::{ActionKind, TransactionRecord};
use crate::context::BankContext;
use crate::database::models::{Account, AccountType};
use crate::error::BankError;
use crate::security::pin;

/// Longest username accepted at account creation
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Details collected by the account creation flow
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub name: String,
    pub pin: String,
    pub account_type: AccountType,
}

/// Check that a username is usable as a store key
pub fn validate_username(username: &str) -> Result<(), BankError> {
    if username.is_empty() {
        return Err(BankError::validation("Username cannot be empty."));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(BankError::validation("Username cannot contain spaces."));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(BankError::validation(format!(
            "Username cannot be longer than {} characters.",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

/// Get account details by username
pub fn get_account(ctx: &BankContext, username: &str) -> Result<Account, BankError> {
    ctx.store()
        .get(username)?
        .ok_or_else(|| BankError::NotFound(username.to_string()))
}

/// Create a new zero-balance account
pub fn create_account(ctx: &mut BankContext, new_account: NewAccount) -> Result<Account, BankError> {
    let username = new_account.username.trim();
    validate_username(username)?;

    if ctx.store().get(username)?.is_some() {
        return Err(BankError::validation("Username already exists."));
    }

    let pin_hash = pin::hash_pin(&new_account.pin)?;

    let name = match new_account.name.trim() {
        "" => username.to_string(),
        name => name.to_string(),
    };

    let account = Account::new(username.to_string(), name, pin_hash, new_account.account_type);

    ctx.store_mut().upsert(&account)?;
    ctx.record(&TransactionRecord::new(&account, ActionKind::Create, None))?;

    info!(
        "Created {} account for {}",
        account.account_type.as_str(),
        account.username
    );
    Ok(account)
}

/// Delete an account, returning its final state
pub fn delete_account(ctx: &mut BankContext, username: &str) -> Result<Account, BankError> {
    let account = get_account(ctx, username)?;

    if !ctx.store_mut().delete(username)? {
        return Err(BankError::NotFound(username.to_string()));
    }
    ctx.record(&TransactionRecord::new(&account, ActionKind::Delete, None))?;

    if !account.balance.is_zero() {
        warn!(
            "Deleted account {} with remaining balance ${:.2}",
            username, account.balance
        );
    }
    info!("Deleted account {}", username);
    Ok(account)
}

/// Replace the PIN digest of an existing account
pub fn reset_pin(ctx: &mut BankContext, username: &str, new_pin: &str) -> Result<Account, BankError> {
    let mut account = get_account(ctx, username)?;

    account.pin_hash = pin::hash_pin(new_pin)?;
    ctx.store_mut().upsert(&account)?;
    ctx.record(&TransactionRecord::new(&account, ActionKind::PinReset, None))?;

    info!("PIN reset for {}", username);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TransactionLog;
    use crate::database::SqliteAccountStore;
    use rust_decimal::Decimal;
    use tempfile::{tempdir, TempDir};
    use test_case::test_case;

    fn setup_test_ctx() -> (TempDir, BankContext) {
        let temp_dir = tempdir().unwrap();
        let store = SqliteAccountStore::open_in_memory().unwrap();
        let log = TransactionLog::open(temp_dir.path().join("transactions.csv").to_str().unwrap()).unwrap();
        (temp_dir, BankContext::new(Box::new(store), log, 3))
    }

    fn new_account(username: &str, pin: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            name: "Test User".to_string(),
            pin: pin.to_string(),
            account_type: AccountType::Savings,
        }
    }

    #[test]
    fn test_create_account() {
        let (_dir, mut ctx) = setup_test_ctx();

        let account = create_account(&mut ctx, new_account("testuser", "1234")).unwrap();

        assert_eq!(account.username, "testuser");
        assert_eq!(account.account_type, AccountType::Savings);
        assert_eq!(account.balance, Decimal::ZERO);
        assert_ne!(account.pin_hash, "1234");
        assert!(pin::verify_pin("1234", &account.pin_hash));

        let stored = get_account(&ctx, "testuser").unwrap();
        assert_eq!(stored, account);
    }

    #[test]
    fn test_create_account_defaults_name_to_username() {
        let (_dir, mut ctx) = setup_test_ctx();
        let mut details = new_account("nameless", "1234");
        details.name = "   ".to_string();

        let account = create_account(&mut ctx, details).unwrap();
        assert_eq!(account.name, "nameless");
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let (_dir, mut ctx) = setup_test_ctx();
        create_account(&mut ctx, new_account("testuser", "1234")).unwrap();

        let result = create_account(&mut ctx, new_account("testuser", "9876"));
        assert!(matches!(result, Err(BankError::Validation(msg)) if msg == "Username already exists."));

        let stored = get_account(&ctx, "testuser").unwrap();
        assert!(pin::verify_pin("1234", &stored.pin_hash), "Original PIN must survive");
    }

    #[test]
    fn test_malformed_pin_creates_nothing() {
        let (_dir, mut ctx) = setup_test_ctx();

        let result = create_account(&mut ctx, new_account("testuser", "12ab"));
        assert!(matches!(result, Err(BankError::Validation(_))));
        assert!(ctx.store().load().unwrap().is_empty());
    }

    #[test_case("" ; "empty")]
    #[test_case("two words" ; "whitespace")]
    #[test_case("a_very_long_username_that_keeps_going" ; "too long")]
    fn test_invalid_username(username: &str) {
        assert!(matches!(validate_username(username), Err(BankError::Validation(_))));
    }

    #[test]
    fn test_delete_account() {
        let (_dir, mut ctx) = setup_test_ctx();
        create_account(&mut ctx, new_account("testuser", "1234")).unwrap();
        create_account(&mut ctx, new_account("other", "1234")).unwrap();

        let deleted = delete_account(&mut ctx, "testuser").unwrap();
        assert_eq!(deleted.username, "testuser");

        assert!(matches!(get_account(&ctx, "testuser"), Err(BankError::NotFound(_))));
        let remaining = ctx.store().load().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].username, "other");
    }

    #[test]
    fn test_delete_missing_account() {
        let (_dir, mut ctx) = setup_test_ctx();
        assert!(matches!(delete_account(&mut ctx, "ghost"), Err(BankError::NotFound(_))));
    }

    #[test]
    fn test_reset_pin() {
        let (_dir, mut ctx) = setup_test_ctx();
        create_account(&mut ctx, new_account("testuser", "1234")).unwrap();

        reset_pin(&mut ctx, "testuser", "5678").unwrap();

        let stored = get_account(&ctx, "testuser").unwrap();
        assert!(pin::verify_pin("5678", &stored.pin_hash));
        assert!(!pin::verify_pin("1234", &stored.pin_hash));
    }

    #[test]
    fn test_reset_pin_rejects_malformed_pin() {
        let (_dir, mut ctx) = setup_test_ctx();
        create_account(&mut ctx, new_account("testuser", "1234")).unwrap();

        assert!(matches!(reset_pin(&mut ctx, "testuser", "98"), Err(BankError::Validation(_))));
        let stored = get_account(&ctx, "testuser").unwrap();
        assert!(pin::verify_pin("1234", &stored.pin_hash));
    }
}
