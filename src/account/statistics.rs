use log::debug;
use rust_decimal::Decimal;

use crate::database::models::{Account, AccountType};
use crate::database::AccountStore;
use crate::error::StorageError;

/// Average balance for one account type
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    pub account_type: AccountType,
    pub count: usize,
    pub mean: Decimal,
    /// Usernames with a balance strictly above `mean`, in store order
    pub above_average: Vec<String>,
}

/// Per-type averages across every account
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatisticsReport {
    /// Only types with at least one account appear, checking first
    pub partitions: Vec<PartitionStats>,
}

impl StatisticsReport {
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn partition(&self, account_type: AccountType) -> Option<&PartitionStats> {
        self.partitions.iter().find(|p| p.account_type == account_type)
    }

    /// Every above-average username, across all types
    pub fn above_average(&self) -> Vec<&str> {
        self.partitions
            .iter()
            .flat_map(|p| p.above_average.iter().map(String::as_str))
            .collect()
    }
}

/// Read all accounts and compute a fresh report
pub fn report(store: &dyn AccountStore) -> Result<StatisticsReport, StorageError> {
    let accounts = store.load()?;
    debug!("Computing statistics over {} accounts", accounts.len());
    Ok(summarize(&accounts))
}

/// Partition by account type and compare each balance with its partition mean
pub fn summarize(accounts: &[Account]) -> StatisticsReport {
    let partitions = AccountType::ALL
        .iter()
        .filter_map(|account_type| {
            let members: Vec<&Account> = accounts
                .iter()
                .filter(|a| a.account_type == *account_type)
                .collect();

            if members.is_empty() {
                return None;
            }

            let mean = mean_balance(&members);

            let above_average = members
                .iter()
                .filter(|a| a.balance > mean)
                .map(|a| a.username.clone())
                .collect();

            Some(PartitionStats {
                account_type: *account_type,
                count: members.len(),
                mean,
                above_average,
            })
        })
        .collect();

    StatisticsReport { partitions }
}

/// Mean of the balances, dividing each term first when the plain sum overflows
fn mean_balance(members: &[&Account]) -> Decimal {
    let count = Decimal::from(members.len());
    match members
        .iter()
        .try_fold(Decimal::ZERO, |total, a| total.checked_add(a.balance))
    {
        Some(total) => total / count,
        None => {
            debug!("Balance total overflowed, averaging term by term");
            // rounding each term can nudge the result past the largest balance
            members
                .iter()
                .try_fold(Decimal::ZERO, |mean, a| mean.checked_add(a.balance / count))
                .unwrap_or(Decimal::MAX)
        }
    }
}
