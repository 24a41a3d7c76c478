//! Account balance aggregation.
//!
//! Budget and tracking accounts sum transactions by `account`, category
//! accounts by `category`. Sums are rounded to cents before being surfaced.

use std::collections::HashMap;

use envelope_shared::types::{AccountId, round_to_cents};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::transaction::Transaction;

/// An account with its computed balance. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account.
    #[serde(flatten)]
    pub account: Account,
    /// Rounded sum of matching transaction amounts.
    pub balance: Decimal,
}

/// The slice of a transaction that balances depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLine {
    /// Signed amount.
    pub amount: Decimal,
    /// Budget or tracking account reference.
    pub account: Option<AccountId>,
    /// Category reference.
    pub category: Option<AccountId>,
}

impl From<&Transaction> for BalanceLine {
    fn from(tx: &Transaction) -> Self {
        Self {
            amount: tx.amount,
            account: tx.account,
            category: tx.category,
        }
    }
}

/// Computes the balance of every given account.
///
/// Accounts without matching lines get a zero balance. Output order follows
/// the input order.
#[must_use]
pub fn aggregate_balances(accounts: Vec<Account>, lines: &[BalanceLine]) -> Vec<AccountBalance> {
    let mut by_account: HashMap<AccountId, Decimal> = HashMap::new();
    let mut by_category: HashMap<AccountId, Decimal> = HashMap::new();

    for line in lines {
        if let Some(id) = line.account {
            *by_account.entry(id).or_default() += line.amount;
        }
        if let Some(id) = line.category {
            *by_category.entry(id).or_default() += line.amount;
        }
    }

    accounts
        .into_iter()
        .map(|account| {
            let sums = if account.account_type.tallies_by_category() {
                &by_category
            } else {
                &by_account
            };
            let balance = round_to_cents(sums.get(&account.id).copied().unwrap_or_default());
            AccountBalance { account, balance }
        })
        .collect()
}
