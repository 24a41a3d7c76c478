//! Pairing-aware update semantics.
//!
//! `account` and `pair_key` never change after creation. Changing the amount
//! of one transfer leg moves its sibling to the negated value.

use envelope_shared::types::AccountId;
use rust_decimal::Decimal;

use super::transaction::{Transaction, TransactionUpdate};

/// Builds the overwritten record, pinning `id`, `account` and `pair_key`.
#[must_use]
pub fn apply_overwrite(stored: &Transaction, update: TransactionUpdate) -> Transaction {
    Transaction {
        id: stored.id,
        time: update.time,
        payee: update.payee,
        description: update.description,
        amount: update.amount,
        account: stored.account,
        category: update.category,
        cleared: update.cleared,
        reconciled: update.reconciled,
        pair_key: stored.pair_key,
    }
}

/// Sets the category. Removing a category is not possible this way.
#[must_use]
pub fn apply_category(stored: &Transaction, category: AccountId) -> Transaction {
    Transaction {
        category: Some(category),
        ..stored.clone()
    }
}

/// New amount for the sibling leg, if it has to follow this update.
#[must_use]
pub fn sibling_amount(stored: &Transaction, updated: &Transaction) -> Option<Decimal> {
    (stored.is_paired() && stored.amount != updated.amount).then(|| -updated.amount)
}
