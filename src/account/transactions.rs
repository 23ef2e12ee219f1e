use log::{debug, info};
use rust_decimal::Decimal;

use crate::audit::{ActionKind, TransactionRecord};
use crate::context::BankContext;
use crate::database::models::Account;
use crate::error::BankError;

/// Most fractional digits an amount may carry
pub const AMOUNT_SCALE: u32 = 2;

/// Direction of a balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }

    fn action(&self) -> ActionKind {
        match self {
            TransactionType::Deposit => ActionKind::Deposit,
            TransactionType::Withdrawal => ActionKind::Withdraw,
        }
    }
}

/// Parse an amount typed at the prompt; accepts an optional leading `$` and thousands separators
pub fn parse_amount(input: &str) -> Result<Decimal, BankError> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let amount = cleaned
        .parse::<Decimal>()
        .map_err(|_| BankError::validation(format!("Invalid amount: '{}'", input.trim())))?;

    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: Decimal) -> Result<(), BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::validation("Invalid amount: must be greater than 0"));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(BankError::validation(format!(
            "Invalid amount: at most {} decimal places allowed",
            AMOUNT_SCALE
        )));
    }
    Ok(())
}

/// Deposit funds into an account
pub fn deposit(ctx: &mut BankContext, username: &str, amount: Decimal) -> Result<Account, BankError> {
    process_transaction(ctx, username, TransactionType::Deposit, amount)
}

/// Withdraw funds from an account
pub fn withdraw(ctx: &mut BankContext, username: &str, amount: Decimal) -> Result<Account, BankError> {
    process_transaction(ctx, username, TransactionType::Withdrawal, amount)
}

/// Apply a deposit or withdrawal, persist the account, then log it.
///
/// A withdrawal larger than the balance fails before anything is written.
pub fn process_transaction(
    ctx: &mut BankContext,
    username: &str,
    transaction_type: TransactionType,
    amount: Decimal,
) -> Result<Account, BankError> {
    debug!(
        "Processing {} of ${:.2} for {}",
        transaction_type.as_str(),
        amount,
        username
    );

    validate_amount(amount)?;

    let mut account = ctx
        .store()
        .get(username)?
        .ok_or_else(|| BankError::NotFound(username.to_string()))?;

    let new_balance = match transaction_type {
        TransactionType::Deposit => account.balance.checked_add(amount),
        TransactionType::Withdrawal => {
            if amount > account.balance {
                return Err(BankError::InsufficientFunds {
                    requested: amount,
                    available: account.balance,
                });
            }
            account.balance.checked_sub(amount)
        }
    }
    .ok_or_else(|| BankError::validation("Amount would overflow the balance."))?;

    account.balance = new_balance;
    ctx.store_mut().upsert(&account)?;
    ctx.record(&TransactionRecord::new(
        &account,
        transaction_type.action(),
        Some(amount),
    ))?;

    info!(
        "{} of ${:.2} for {} complete, balance ${:.2}",
        transaction_type.as_str(),
        amount,
        username,
        account.balance
    );

    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TransactionLog;
    use crate::database::models::AccountType;
    use crate::database::{AccountStore, MockAccountStore, SqliteAccountStore};
    use crate::error::StorageError;
    use crate::security::pin;
    use tempfile::{tempdir, TempDir};
    use test_case::test_case;

    fn test_account(balance: Decimal) -> Account {
        let mut account = Account::new(
            "testuser".to_string(),
            "Test User".to_string(),
            pin::hash_pin("1234").unwrap(),
            AccountType::Checking,
        );
        account.balance = balance;
        account
    }

    // Setup test environment
    fn setup_test_ctx(balance: Decimal) -> (TempDir, BankContext) {
        let temp_dir = tempdir().unwrap();
        let mut store = SqliteAccountStore::open_in_memory().unwrap();
        store.upsert(&test_account(balance)).unwrap();
        let log = TransactionLog::open(temp_dir.path().join("transactions.csv").to_str().unwrap()).unwrap();
        (temp_dir, BankContext::new(Box::new(store), log, 3))
    }

    fn log_lines(dir: &TempDir) -> usize {
        std::fs::read_to_string(dir.path().join("transactions.csv"))
            .unwrap()
            .lines()
            .count()
    }

    #[test]
    fn test_process_deposit() {
        let (dir, mut ctx) = setup_test_ctx(Decimal::new(100, 0));

        let account = deposit(&mut ctx, "testuser", Decimal::new(2550, 2)).unwrap();
        assert_eq!(account.balance, Decimal::new(12550, 2));

        let stored = ctx.store().get("testuser").unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::new(12550, 2));
        assert_eq!(log_lines(&dir), 2);
    }

    #[test]
    fn test_deposit_then_withdraw_restores_balance() {
        let (_dir, mut ctx) = setup_test_ctx(Decimal::new(1001, 2));

        for amount in [Decimal::new(1, 2), Decimal::new(10, 1), Decimal::new(33333, 2)] {
            deposit(&mut ctx, "testuser", amount).unwrap();
            let account = withdraw(&mut ctx, "testuser", amount).unwrap();
            assert_eq!(account.balance, Decimal::new(1001, 2));
        }
    }

    #[test]
    fn test_process_withdrawal_with_insufficient_funds() {
        let (dir, mut ctx) = setup_test_ctx(Decimal::new(50, 0));

        let result = withdraw(&mut ctx, "testuser", Decimal::new(5001, 2));
        match result {
            Err(BankError::InsufficientFunds { requested, available }) => {
                assert_eq!(requested, Decimal::new(5001, 2));
                assert_eq!(available, Decimal::new(50, 0));
            }
            other => panic!("Expected InsufficientFunds, got {:?}", other),
        }

        let stored = ctx.store().get("testuser").unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::new(50, 0), "Balance must be unchanged");
        assert_eq!(log_lines(&dir), 1, "Nothing should be logged");
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let (_dir, mut ctx) = setup_test_ctx(Decimal::new(50, 0));

        let account = withdraw(&mut ctx, "testuser", Decimal::new(50, 0)).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let (dir, mut ctx) = setup_test_ctx(Decimal::ZERO);

        let max = parse_amount("79228162514264337593543950335").unwrap();
        assert_eq!(max, Decimal::MAX);
        deposit(&mut ctx, "testuser", max).unwrap();

        let result = deposit(&mut ctx, "testuser", Decimal::ONE);
        assert!(matches!(result, Err(BankError::Validation(_))));

        let stored = ctx.store().get("testuser").unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::MAX);
        assert_eq!(log_lines(&dir), 2, "Only the first deposit is logged");
    }

    #[test]
    fn test_unknown_account() {
        let (_dir, mut ctx) = setup_test_ctx(Decimal::ZERO);

        let result = deposit(&mut ctx, "ghost", Decimal::ONE);
        assert!(matches!(result, Err(BankError::NotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let (_dir, mut ctx) = setup_test_ctx(Decimal::new(10, 0));

        assert!(matches!(
            deposit(&mut ctx, "testuser", Decimal::ZERO),
            Err(BankError::Validation(_))
        ));
        assert!(matches!(
            withdraw(&mut ctx, "testuser", Decimal::new(-5, 0)),
            Err(BankError::Validation(_))
        ));
    }

    #[test]
    fn test_store_failure_skips_log() {
        let temp_dir = tempdir().unwrap();
        let mut store = MockAccountStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(test_account(Decimal::new(10, 0)))));
        store.expect_upsert().times(1).returning(|_| {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        });
        let log_path = temp_dir.path().join("transactions.csv");
        let log = TransactionLog::open(log_path.to_str().unwrap()).unwrap();
        let mut ctx = BankContext::new(Box::new(store), log, 3);

        let result = deposit(&mut ctx, "testuser", Decimal::ONE);
        assert!(matches!(result, Err(ref e) if e.is_storage()));
        assert_eq!(std::fs::read_to_string(log_path).unwrap().lines().count(), 1);
    }

    #[test_case("100", Decimal::new(100, 0) ; "whole number")]
    #[test_case("12.5", Decimal::new(125, 1) ; "one decimal")]
    #[test_case(" $1,250.75 ", Decimal::new(125075, 2) ; "currency formatting")]
    #[test_case("0.01", Decimal::new(1, 2) ; "smallest amount")]
    #[test_case("3.10", Decimal::new(31, 1) ; "trailing zero")]
    fn test_parse_amount_accepts(input: &str, expected: Decimal) {
        assert_eq!(parse_amount(input).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("abc" ; "not a number")]
    #[test_case("0" ; "zero")]
    #[test_case("-20" ; "negative")]
    #[test_case("1.005" ; "too many decimals")]
    fn test_parse_amount_rejects(input: &str) {
        assert!(matches!(parse_amount(input), Err(BankError::Validation(_))));
    }
}
