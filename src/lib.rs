pub mod balance;
pub mod config;
pub mod debts;
pub mod error;
pub mod routes;
pub mod schemas;
pub mod store;
pub mod summary;

#[cfg(test)]
mod props;

pub use balance::{compute_balance_from_ledger, compute_balances, Balances, SplitPolicy};
pub use debts::{resolve_debts, Debt, MatchOrder, Settlement};
pub use error::{AppError, LedgerError};
pub use schemas::{Expense, Ledger, MemberName, NewExpense};
pub use summary::{member_summary, MemberSummary};
