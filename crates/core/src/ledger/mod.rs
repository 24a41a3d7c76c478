//! Envelope ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Accounts and the well-known seed accounts
//! - Transactions, create drafts and overwrite inputs
//! - Business rule validation
//! - Balance aggregation
//! - Transfer planning with pairing keys
//! - Pairing-aware update semantics
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod error;
pub mod transaction;
pub mod transfer;
pub mod update;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod transfer_props;
#[cfg(test)]
mod validation_props;

pub use account::{
    ACCOUNT_ID_NAMESPACE, Account, AccountType, NewAccount, STARTING_BALANCE, UNALLOCATED_MONEY,
    default_accounts, validate_account_name,
};
pub use balance::{AccountBalance, BalanceLine, aggregate_balances};
pub use error::LedgerError;
pub use transaction::{Transaction, TransactionDraft, TransactionUpdate, TimeWindow, zero_time};
pub use transfer::{TransferPlan, plan_transfer};
pub use update::{apply_category, apply_overwrite, sibling_amount};
pub use validation::{Violation, Violations, validate_transaction};
