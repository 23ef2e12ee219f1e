// Account management module
// Account creation and deletion, deposits and withdrawals, and the balance
// statistics report.

pub mod management;
pub mod statistics;
pub mod transactions;

pub use management::{create_account, delete_account, get_account, reset_pin, NewAccount};
pub use statistics::{report, summarize, PartitionStats, StatisticsReport};
pub use transactions::{deposit, parse_amount, process_transaction, withdraw, TransactionType};
